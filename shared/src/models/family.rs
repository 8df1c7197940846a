//! Family Model (family circle, membership, invitations, memorial links)

use serde::{Deserialize, Serialize};

/// Invitations stay answerable for 30 days
pub const INVITATION_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Member role inside a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum FamilyRole {
    Admin,
    Member,
}

impl FamilyRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Family circle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Family {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: String,
    /// Unique, 8 chars `A-Z0-9`
    pub invite_code: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create family payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyCreate {
    pub name: String,
    pub description: Option<String>,
}

/// Update family payload (absent or blank fields are left unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Membership row, unique per (family_id, user_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FamilyMember {
    pub id: String,
    pub family_id: String,
    pub user_id: String,
    pub role: FamilyRole,
    pub joined_at: i64,
}

/// Family with its members and the caller's role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyDetail {
    #[serde(flatten)]
    pub family: Family,
    pub members: Vec<FamilyMember>,
    pub my_role: FamilyRole,
}

/// Memorial ↔ family association
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MemorialFamily {
    pub id: String,
    pub memorial_id: String,
    pub family_id: String,
    pub created_at: i64,
}

/// Invitation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

/// Invitation from a family admin to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FamilyInvitation {
    pub id: String,
    pub family_id: String,
    pub inviter_id: String,
    pub invitee_id: String,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FamilyInvitation {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}

/// Invite members payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteMembersRequest {
    pub user_ids: Vec<String>,
    pub message: Option<String>,
}

/// Join-by-code payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinByCodeRequest {
    pub invite_code: String,
}

/// Invitation response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondInvitationRequest {
    pub accept: bool,
}

/// Member role change payload; role must be `admin` or `member`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

/// Link memorial payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkMemorialRequest {
    pub memorial_id: String,
}
