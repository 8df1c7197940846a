//! Memorial reminder Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reminders within this many days count as upcoming
pub const UPCOMING_REMINDER_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum ReminderType {
    Birthday,
    DeathAnniversary,
    Festival,
}

impl ReminderType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "birthday" => Some(Self::Birthday),
            "death_anniversary" => Some(Self::DeathAnniversary),
            "festival" => Some(Self::Festival),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemorialReminder {
    pub id: String,
    pub memorial_id: String,
    pub family_id: String,
    pub reminder_type: ReminderType,
    pub reminder_date: NaiveDate,
    pub title: String,
    pub content: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderCreate {
    pub memorial_id: String,
    pub reminder_type: String,
    pub reminder_date: NaiveDate,
    pub title: String,
    pub content: Option<String>,
}
