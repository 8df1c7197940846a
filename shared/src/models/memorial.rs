//! Memorial Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-memorial visibility class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i16)]
pub enum PrivacyLevel {
    /// Anyone may view
    Public = 0,
    /// Members of linked families, plus explicit grants
    Family = 1,
    /// Creator and user-scoped grants only
    Private = 2,
}

impl From<PrivacyLevel> for i16 {
    fn from(level: PrivacyLevel) -> Self {
        level as i16
    }
}

impl TryFrom<i16> for PrivacyLevel {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Public),
            1 => Ok(Self::Family),
            2 => Ok(Self::Private),
            other => Err(format!("invalid privacy level: {other}")),
        }
    }
}

/// Memorial lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum MemorialStatus {
    #[default]
    Active,
    Deleted,
}

/// Memorial entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Memorial {
    pub id: String,
    /// Immutable after creation
    pub creator_id: String,
    pub deceased_name: String,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub epitaph: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub privacy_level: PrivacyLevel,
    pub status: MemorialStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Memorial {
    pub fn is_active(&self) -> bool {
        self.status == MemorialStatus::Active
    }
}

/// Create memorial payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorialCreate {
    pub deceased_name: String,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub epitaph: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    /// Defaults to family-visible
    pub privacy_level: Option<i16>,
}

/// Update memorial payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorialUpdate {
    pub deceased_name: Option<String>,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub epitaph: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

/// Kind of worship offering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum WorshipType {
    Flower,
    Candle,
    Incense,
    Tribute,
    Prayer,
}

impl WorshipType {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "flower" => Some(Self::Flower),
            "candle" => Some(Self::Candle),
            "incense" => Some(Self::Incense),
            "tribute" => Some(Self::Tribute),
            "prayer" => Some(Self::Prayer),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Flower => "flower",
            Self::Candle => "candle",
            Self::Incense => "incense",
            Self::Tribute => "tribute",
            Self::Prayer => "prayer",
        }
    }
}

/// Worship record left on a memorial
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WorshipRecord {
    pub id: String,
    pub memorial_id: String,
    pub user_id: String,
    pub worship_type: WorshipType,
    pub content: Value,
    pub created_at: i64,
}

/// Worship payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorshipCreate {
    pub worship_type: String,
    #[serde(default)]
    pub content: Value,
}

/// One visit to a memorial (at most one per visitor per day)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VisitorRecord {
    pub id: String,
    pub memorial_id: String,
    pub visitor_id: String,
    pub ip_address: Option<String>,
    pub visited_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privacy_level_serializes_as_number() {
        assert_eq!(serde_json::to_string(&PrivacyLevel::Private).unwrap(), "2");
        let level: PrivacyLevel = serde_json::from_str("1").unwrap();
        assert_eq!(level, PrivacyLevel::Family);
        assert!(serde_json::from_str::<PrivacyLevel>("3").is_err());
    }

    #[test]
    fn privacy_levels_are_ordered_by_strictness() {
        assert!(PrivacyLevel::Public < PrivacyLevel::Family);
        assert!(PrivacyLevel::Family < PrivacyLevel::Private);
    }

    #[test]
    fn worship_type_db_mapping() {
        for t in [
            WorshipType::Flower,
            WorshipType::Candle,
            WorshipType::Incense,
            WorshipType::Tribute,
            WorshipType::Prayer,
        ] {
            assert_eq!(WorshipType::from_db(t.as_db()), Some(t));
        }
        assert_eq!(WorshipType::from_db("fireworks"), None);
    }
}
