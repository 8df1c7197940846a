use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::MemorialReminder;

use super::PgStore;
use crate::db::{ReminderRepo, StoreResult};

#[async_trait]
impl ReminderRepo for PgStore {
    async fn insert_reminder(&self, r: &MemorialReminder) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO memorial_reminders
                 (id, memorial_id, family_id, reminder_type, reminder_date, title, content,
                  is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&r.id)
        .bind(&r.memorial_id)
        .bind(&r.family_id)
        .bind(r.reminder_type)
        .bind(r.reminder_date)
        .bind(&r.title)
        .bind(&r.content)
        .bind(r.is_active)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_reminder(&self, id: &str) -> StoreResult<Option<MemorialReminder>> {
        Ok(
            sqlx::query_as("SELECT * FROM memorial_reminders WHERE id = $1 AND is_active")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_reminders(
        &self,
        family_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<MemorialReminder>> {
        Ok(sqlx::query_as(
            "SELECT * FROM memorial_reminders
             WHERE family_id = $1 AND is_active
               AND ($2::date IS NULL OR reminder_date >= $2)
               AND ($3::date IS NULL OR reminder_date <= $3)
             ORDER BY reminder_date ASC",
        )
        .bind(family_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn deactivate_reminder(&self, id: &str, now: i64) -> StoreResult<bool> {
        let rows = sqlx::query(
            "UPDATE memorial_reminders SET is_active = FALSE, updated_at = $1
             WHERE id = $2 AND is_active",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }
}
