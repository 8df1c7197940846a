use async_trait::async_trait;
use shared::models::{Memorial, VisitorRecord, WorshipRecord};

use super::PgStore;
use crate::db::{MemorialRepo, Page, StoreResult};

#[async_trait]
impl MemorialRepo for PgStore {
    async fn insert_memorial(&self, m: &Memorial) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO memorials (id, creator_id, deceased_name, biography, avatar_url, epitaph,
                                    birth_date, death_date, privacy_level, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&m.id)
        .bind(&m.creator_id)
        .bind(&m.deceased_name)
        .bind(&m.biography)
        .bind(&m.avatar_url)
        .bind(&m.epitaph)
        .bind(m.birth_date)
        .bind(m.death_date)
        .bind(m.privacy_level)
        .bind(m.status)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_active_memorial(&self, id: &str) -> StoreResult<Option<Memorial>> {
        Ok(
            sqlx::query_as("SELECT * FROM memorials WHERE id = $1 AND status = 'active'")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_memorial(&self, m: &Memorial) -> StoreResult<()> {
        sqlx::query(
            "UPDATE memorials
             SET deceased_name = $1, biography = $2, avatar_url = $3, epitaph = $4,
                 birth_date = $5, death_date = $6, updated_at = $7
             WHERE id = $8 AND status = 'active'",
        )
        .bind(&m.deceased_name)
        .bind(&m.biography)
        .bind(&m.avatar_url)
        .bind(&m.epitaph)
        .bind(m.birth_date)
        .bind(m.death_date)
        .bind(m.updated_at)
        .bind(&m.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn soft_delete_memorial(&self, id: &str, now: i64) -> StoreResult<bool> {
        let rows = sqlx::query(
            "UPDATE memorials SET status = 'deleted', updated_at = $1
             WHERE id = $2 AND status = 'active'",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn list_accessible_memorials(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Memorial>> {
        const FILTER: &str = "m.status = 'active' AND (
                 m.creator_id = $1
                 OR EXISTS (
                     SELECT 1 FROM memorial_families mf
                     JOIN family_members fm ON fm.family_id = mf.family_id
                     WHERE mf.memorial_id = m.id AND fm.user_id = $1
                 ))";

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM memorials m WHERE {FILTER}"))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as(&format!(
            "SELECT m.* FROM memorials m WHERE {FILTER}
             ORDER BY m.created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn insert_worship_record(&self, r: &WorshipRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO worship_records (id, memorial_id, user_id, worship_type, content, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&r.id)
        .bind(&r.memorial_id)
        .bind(&r.user_id)
        .bind(r.worship_type)
        .bind(&r.content)
        .bind(r.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_visit(&self, v: &VisitorRecord, since: i64) -> StoreResult<bool> {
        let rows = sqlx::query(
            "INSERT INTO visitor_records (id, memorial_id, visitor_id, ip_address, visited_at)
             SELECT $1, $2, $3, $4, $5
             WHERE NOT EXISTS (
                 SELECT 1 FROM visitor_records
                 WHERE memorial_id = $2 AND visitor_id = $3 AND visited_at >= $6
             )",
        )
        .bind(&v.id)
        .bind(&v.memorial_id)
        .bind(&v.visitor_id)
        .bind(&v.ip_address)
        .bind(v.visited_at)
        .bind(since)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn list_visitors(
        &self,
        memorial_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<VisitorRecord>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visitor_records WHERE memorial_id = $1")
                .bind(memorial_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as(
            "SELECT * FROM visitor_records WHERE memorial_id = $1
             ORDER BY visited_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(memorial_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn delete_visitors_before(&self, memorial_id: &str, cutoff: i64) -> StoreResult<u64> {
        let rows =
            sqlx::query("DELETE FROM visitor_records WHERE memorial_id = $1 AND visited_at < $2")
                .bind(memorial_id)
                .bind(cutoff)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows)
    }
}
