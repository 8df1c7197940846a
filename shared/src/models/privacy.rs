//! Privacy Model (grants, blacklist, access requests)

use serde::{Deserialize, Serialize};

use super::memorial::{Memorial, PrivacyLevel};

/// Fine-grained visitor capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum PermissionType {
    View,
    Worship,
    Comment,
    Share,
}

impl PermissionType {
    pub const ALL: [PermissionType; 4] = [Self::View, Self::Worship, Self::Comment, Self::Share];

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "view" => Some(Self::View),
            "worship" => Some(Self::Worship),
            "comment" => Some(Self::Comment),
            "share" => Some(Self::Share),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Worship => "worship",
            Self::Comment => "comment",
            Self::Share => "share",
        }
    }
}

/// Coarse result of a visibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Owner,
    Family,
    None,
}

/// Result of `can_access_memorial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorialAccess {
    pub allowed: bool,
    pub level: AccessLevel,
}

impl MemorialAccess {
    pub const OWNER: Self = Self {
        allowed: true,
        level: AccessLevel::Owner,
    };
    pub const FAMILY: Self = Self {
        allowed: true,
        level: AccessLevel::Family,
    };
    pub const GRANTED: Self = Self {
        allowed: true,
        level: AccessLevel::None,
    };
    pub const DENIED: Self = Self {
        allowed: false,
        level: AccessLevel::None,
    };
}

/// Explicit grant; exactly one of `family_id` / `user_id` is set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VisitorPermission {
    pub id: String,
    pub memorial_id: String,
    pub family_id: Option<String>,
    pub user_id: Option<String>,
    pub permission_type: PermissionType,
    pub is_allowed: bool,
    pub created_at: i64,
}

/// Blacklist entry, unique per (memorial_id, user_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BlacklistEntry {
    pub id: String,
    pub memorial_id: String,
    pub user_id: String,
    pub reason: Option<String>,
    pub created_at: i64,
}

/// Access request state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum AccessRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Request from a visitor for access to a memorial
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AccessRequest {
    pub id: String,
    pub memorial_id: String,
    pub user_id: String,
    pub message: Option<String>,
    pub status: AccessRequestStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Full desired privacy state for a memorial; replaces the stored state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacySettingsRequest {
    pub memorial_id: String,
    pub privacy_level: i16,
    #[serde(default)]
    pub allowed_family_ids: Vec<String>,
    #[serde(default)]
    pub allowed_user_ids: Vec<String>,
    #[serde(default)]
    pub visitor_permissions: Vec<String>,
    #[serde(default)]
    pub blocked_user_ids: Vec<String>,
}

/// Current privacy state, as seen by the creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub memorial: Memorial,
    pub privacy_level: PrivacyLevel,
    pub permissions: Vec<VisitorPermission>,
    pub blacklist: Vec<BlacklistEntry>,
    pub access_requests: Vec<AccessRequest>,
}

/// Access request payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestAccessRequest {
    pub message: Option<String>,
}

/// Access request resolution payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleAccessRequest {
    pub approve: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Blacklist payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlacklistRequest {
    pub reason: Option<String>,
}
