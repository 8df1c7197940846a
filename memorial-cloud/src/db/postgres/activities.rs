use async_trait::async_trait;
use serde_json::Value;
use shared::models::{CollectiveWorshipParticipant, FamilyActivity};
use sqlx::PgConnection;

use super::PgStore;
use crate::db::{ActivityRepo, Page, StoreResult};

#[async_trait]
impl ActivityRepo for PgStore {
    async fn insert_activity(&self, activity: &FamilyActivity) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_activity_row(&mut *conn, activity).await
    }

    async fn find_activity(&self, id: &str) -> StoreResult<Option<FamilyActivity>> {
        Ok(sqlx::query_as("SELECT * FROM family_activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_activities(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyActivity>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM family_activities WHERE family_id = $1")
                .bind(family_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as(
            "SELECT * FROM family_activities WHERE family_id = $1
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(family_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn create_collective_worship(
        &self,
        activity: &FamilyActivity,
        initiator: &CollectiveWorshipParticipant,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        insert_activity_row(&mut *tx, activity).await?;
        sqlx::query(
            "INSERT INTO collective_worship_participants (activity_id, user_id, joined_at)
             VALUES ($1, $2, $3)",
        )
        .bind(&initiator.activity_id)
        .bind(&initiator.user_id)
        .bind(initiator.joined_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn add_participant(&self, p: &CollectiveWorshipParticipant) -> StoreResult<bool> {
        let rows = sqlx::query(
            "INSERT INTO collective_worship_participants (activity_id, user_id, joined_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (activity_id, user_id) DO NOTHING",
        )
        .bind(&p.activity_id)
        .bind(&p.user_id)
        .bind(p.joined_at)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn list_participants(
        &self,
        activity_id: &str,
    ) -> StoreResult<Vec<CollectiveWorshipParticipant>> {
        Ok(sqlx::query_as(
            "SELECT * FROM collective_worship_participants
             WHERE activity_id = $1 ORDER BY joined_at ASC",
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_activity_content(&self, id: &str, content: &Value) -> StoreResult<bool> {
        let rows = sqlx::query("UPDATE family_activities SET content = $1 WHERE id = $2")
            .bind(content)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}

async fn insert_activity_row(conn: &mut PgConnection, a: &FamilyActivity) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO family_activities (id, family_id, user_id, memorial_id, activity_type, content, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&a.id)
    .bind(&a.family_id)
    .bind(&a.user_id)
    .bind(&a.memorial_id)
    .bind(a.activity_type)
    .bind(&a.content)
    .bind(a.created_at)
    .execute(conn)
    .await?;
    Ok(())
}
