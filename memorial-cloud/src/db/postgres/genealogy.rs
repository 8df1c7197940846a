use async_trait::async_trait;
use shared::models::GenealogyNode;

use super::PgStore;
use crate::db::{GenealogyRepo, StoreResult};

#[async_trait]
impl GenealogyRepo for PgStore {
    async fn insert_genealogy(&self, n: &GenealogyNode) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO family_genealogy
                 (id, family_id, person_name, generation, parent_id, gender, birth_date, death_date,
                  biography, avatar_url, memorial_id, position, achievements, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&n.id)
        .bind(&n.family_id)
        .bind(&n.person_name)
        .bind(n.generation)
        .bind(&n.parent_id)
        .bind(n.gender)
        .bind(n.birth_date)
        .bind(n.death_date)
        .bind(&n.biography)
        .bind(&n.avatar_url)
        .bind(&n.memorial_id)
        .bind(&n.position)
        .bind(&n.achievements)
        .bind(n.created_at)
        .bind(n.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_genealogy(&self, id: &str) -> StoreResult<Option<GenealogyNode>> {
        Ok(sqlx::query_as("SELECT * FROM family_genealogy WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_genealogy(&self, n: &GenealogyNode) -> StoreResult<()> {
        sqlx::query(
            "UPDATE family_genealogy
             SET person_name = $1, generation = $2, parent_id = $3, gender = $4, birth_date = $5,
                 death_date = $6, biography = $7, avatar_url = $8, memorial_id = $9,
                 position = $10, achievements = $11, updated_at = $12
             WHERE id = $13",
        )
        .bind(&n.person_name)
        .bind(n.generation)
        .bind(&n.parent_id)
        .bind(n.gender)
        .bind(n.birth_date)
        .bind(n.death_date)
        .bind(&n.biography)
        .bind(&n.avatar_url)
        .bind(&n.memorial_id)
        .bind(&n.position)
        .bind(&n.achievements)
        .bind(n.updated_at)
        .bind(&n.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_genealogy(&self, family_id: &str) -> StoreResult<Vec<GenealogyNode>> {
        Ok(sqlx::query_as(
            "SELECT * FROM family_genealogy WHERE family_id = $1
             ORDER BY generation ASC, person_name ASC",
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn has_children(&self, id: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM family_genealogy WHERE parent_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_genealogy(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM family_genealogy WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }
}
