use async_trait::async_trait;
use shared::models::{FamilyStory, FamilyTradition, StoryCategory, TraditionCategory};

use super::PgStore;
use crate::db::{HeritageRepo, Page, StoreResult};

#[async_trait]
impl HeritageRepo for PgStore {
    async fn insert_story(&self, s: &FamilyStory) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO family_stories
                 (id, family_id, author_id, title, content, category, period, characters, location,
                  media_files, tags, is_public, view_count, like_count, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(&s.id)
        .bind(&s.family_id)
        .bind(&s.author_id)
        .bind(&s.title)
        .bind(&s.content)
        .bind(s.category)
        .bind(&s.period)
        .bind(&s.characters)
        .bind(&s.location)
        .bind(&s.media_files)
        .bind(&s.tags)
        .bind(s.is_public)
        .bind(s.view_count)
        .bind(s.like_count)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_story(&self, id: &str) -> StoreResult<Option<FamilyStory>> {
        Ok(sqlx::query_as("SELECT * FROM family_stories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_story(&self, s: &FamilyStory) -> StoreResult<()> {
        sqlx::query(
            "UPDATE family_stories
             SET title = $1, content = $2, category = $3, period = $4, characters = $5,
                 location = $6, media_files = $7, tags = $8, is_public = $9, updated_at = $10
             WHERE id = $11",
        )
        .bind(&s.title)
        .bind(&s.content)
        .bind(s.category)
        .bind(&s.period)
        .bind(&s.characters)
        .bind(&s.location)
        .bind(&s.media_files)
        .bind(&s.tags)
        .bind(s.is_public)
        .bind(s.updated_at)
        .bind(&s.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_story(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM family_stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }

    async fn list_stories(
        &self,
        family_id: &str,
        category: Option<StoryCategory>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyStory>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM family_stories
             WHERE family_id = $1 AND is_public AND ($2::text IS NULL OR category = $2)",
        )
        .bind(family_id)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as(
            "SELECT * FROM family_stories
             WHERE family_id = $1 AND is_public AND ($2::text IS NULL OR category = $2)
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(family_id)
        .bind(category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn increment_story_views(&self, id: &str) -> StoreResult<()> {
        sqlx::query("UPDATE family_stories SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_tradition(&self, t: &FamilyTradition) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO family_traditions
                 (id, family_id, name, description, category, origin, practice, meaning,
                  media_files, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&t.id)
        .bind(&t.family_id)
        .bind(&t.name)
        .bind(&t.description)
        .bind(t.category)
        .bind(&t.origin)
        .bind(&t.practice)
        .bind(&t.meaning)
        .bind(&t.media_files)
        .bind(t.is_active)
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_tradition(&self, id: &str) -> StoreResult<Option<FamilyTradition>> {
        Ok(sqlx::query_as("SELECT * FROM family_traditions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_tradition(&self, t: &FamilyTradition) -> StoreResult<()> {
        sqlx::query(
            "UPDATE family_traditions
             SET name = $1, description = $2, category = $3, origin = $4, practice = $5,
                 meaning = $6, media_files = $7, is_active = $8, updated_at = $9
             WHERE id = $10",
        )
        .bind(&t.name)
        .bind(&t.description)
        .bind(t.category)
        .bind(&t.origin)
        .bind(&t.practice)
        .bind(&t.meaning)
        .bind(&t.media_files)
        .bind(t.is_active)
        .bind(t.updated_at)
        .bind(&t.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_tradition(&self, id: &str) -> StoreResult<bool> {
        let rows = sqlx::query("DELETE FROM family_traditions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows > 0)
    }

    async fn list_traditions(
        &self,
        family_id: &str,
        category: Option<TraditionCategory>,
    ) -> StoreResult<Vec<FamilyTradition>> {
        Ok(sqlx::query_as(
            "SELECT * FROM family_traditions
             WHERE family_id = $1 AND ($2::text IS NULL OR category = $2)
             ORDER BY created_at DESC",
        )
        .bind(family_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await?)
    }
}
