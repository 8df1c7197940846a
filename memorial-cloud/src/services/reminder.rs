//! Memorial reminders scoped to a family

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, MemorialReminder, ReminderCreate, ReminderType, UPCOMING_REMINDER_DAYS,
};
use shared::util::{new_id, now_millis};
use shared::validation::{MAX_NAME_LEN, MAX_TEXT_LEN, validate_optional_text, validate_required_text};

use super::access::AccessEvaluator;
use super::activity::ActivityLedger;
use crate::db::Store;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
    ledger: ActivityLedger,
}

/// Inclusive window `[today, today + UPCOMING_REMINDER_DAYS]`
pub fn upcoming_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today, today + Duration::days(UPCOMING_REMINDER_DAYS))
}

impl ReminderService {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator, ledger: ActivityLedger) -> Self {
        Self {
            store,
            access,
            ledger,
        }
    }

    /// Admin only; the memorial must be linked to the family
    pub async fn set_reminder(
        &self,
        actor: &str,
        family_id: &str,
        req: ReminderCreate,
    ) -> ServiceResult<MemorialReminder> {
        self.access.require_family_admin(actor, family_id).await?;

        validate_required_text(&req.title, "title", MAX_NAME_LEN)?;
        validate_optional_text(&req.content, "content", MAX_TEXT_LEN)?;
        let reminder_type = ReminderType::from_db(&req.reminder_type).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidReminderType,
                format!("Unknown reminder type: {}", req.reminder_type),
            )
        })?;
        if !self
            .store
            .is_memorial_linked(family_id, &req.memorial_id)
            .await?
        {
            return Err(ErrorCode::MemorialNotLinked.into());
        }

        let now = now_millis();
        let reminder = MemorialReminder {
            id: new_id(),
            memorial_id: req.memorial_id,
            family_id: family_id.to_string(),
            reminder_type,
            reminder_date: req.reminder_date,
            title: req.title.trim().to_string(),
            content: req.content,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_reminder(&reminder).await?;

        self.ledger
            .record(
                family_id,
                actor,
                Some(&reminder.memorial_id),
                ActivityType::SetReminder,
                json!({
                    "reminder_id": reminder.id,
                    "reminder_type": reminder.reminder_type,
                    "reminder_date": reminder.reminder_date,
                }),
            )
            .await;
        Ok(reminder)
    }

    /// Active reminders ordered by date
    pub async fn list_reminders(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<Vec<MemorialReminder>> {
        self.access.require_family_member(actor, family_id).await?;
        Ok(self.store.list_reminders(family_id, None, None).await?)
    }

    pub async fn upcoming_reminders(
        &self,
        actor: &str,
        family_id: &str,
        today: NaiveDate,
    ) -> ServiceResult<Vec<MemorialReminder>> {
        self.access.require_family_member(actor, family_id).await?;
        let (from, to) = upcoming_window(today);
        Ok(self
            .store
            .list_reminders(family_id, Some(from), Some(to))
            .await?)
    }

    /// Admin only; soft delete
    pub async fn delete_reminder(
        &self,
        actor: &str,
        family_id: &str,
        reminder_id: &str,
    ) -> ServiceResult<()> {
        self.access.require_family_admin(actor, family_id).await?;
        let reminder = self
            .store
            .find_reminder(reminder_id)
            .await?
            .filter(|r| r.family_id == family_id)
            .ok_or(ErrorCode::ReminderNotFound)?;
        if !self
            .store
            .is_memorial_linked(family_id, &reminder.memorial_id)
            .await?
        {
            return Err(ErrorCode::MemorialNotLinked.into());
        }
        if !self
            .store
            .deactivate_reminder(&reminder.id, now_millis())
            .await?
        {
            return Err(ErrorCode::ReminderNotFound.into());
        }

        self.ledger
            .record(
                family_id,
                actor,
                Some(&reminder.memorial_id),
                ActivityType::DeleteReminder,
                json!({ "reminder_id": reminder.id }),
            )
            .await;
        Ok(())
    }
}
