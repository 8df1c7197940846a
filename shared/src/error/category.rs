//! Error category and kind classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Memorial errors
/// - 4xxx: Family errors
/// - 5xxx: Privacy errors
/// - 6xxx: Genealogy and heritage errors
/// - 7xxx: Activity errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Memorial errors (3xxx)
    Memorial,
    /// Family errors (4xxx)
    Family,
    /// Privacy errors (5xxx)
    Privacy,
    /// Genealogy and heritage errors (6xxx)
    Genealogy,
    /// Activity errors (7xxx)
    Activity,
    /// System errors (8xxx, 9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Memorial,
            4000..5000 => Self::Family,
            5000..6000 => Self::Privacy,
            6000..7000 => Self::Genealogy,
            7000..8000 => Self::Activity,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Memorial => "memorial",
            Self::Family => "family",
            Self::Privacy => "privacy",
            Self::Genealogy => "genealogy",
            Self::Activity => "activity",
            Self::System => "system",
        }
    }
}

/// Failure kind, independent of the domain the code belongs to.
///
/// Callers branch on the kind (e.g. "was this a denial or a missing row?")
/// without matching every individual code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Success,
    NotFound,
    Forbidden,
    Conflict,
    Expired,
    Validation,
    Auth,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Get the failure kind for this error code
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Success => ErrorKind::Success,

            Self::NotFound
            | Self::UserNotFound
            | Self::MemorialNotFound
            | Self::MemorialUnavailable
            | Self::FamilyNotFound
            | Self::FamilyMemberNotFound
            | Self::InvalidInviteCode
            | Self::InvitationNotFound
            | Self::MemorialNotLinked
            | Self::ReminderNotFound
            | Self::AccessRequestNotFound
            | Self::GenealogyNotFound
            | Self::StoryNotFound
            | Self::TraditionNotFound
            | Self::ActivityNotFound => ErrorKind::NotFound,

            Self::PermissionDenied
            | Self::MemorialAccessDenied
            | Self::MemorialOwnerRequired
            | Self::NotFamilyMember
            | Self::FamilyAdminRequired
            | Self::FamilyCreatorRequired
            | Self::CannotRemoveCreator
            | Self::CreatorCannotLeave
            | Self::CannotChangeCreatorRole
            | Self::UserBlacklisted
            | Self::CannotBlacklistOwner => ErrorKind::Forbidden,

            Self::AlreadyExists
            | Self::AlreadyFamilyMember
            | Self::InvitationHandled
            | Self::MemorialAlreadyLinked
            | Self::AccessRequestPending
            | Self::AccessRequestHandled
            | Self::AlreadyBlacklisted
            | Self::OwnerCannotRequestAccess
            | Self::GenealogyHasChildren
            | Self::CollectiveWorshipClosed
            | Self::AlreadyParticipating => ErrorKind::Conflict,

            Self::InvitationExpired => ErrorKind::Expired,

            Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountDisabled => ErrorKind::Auth,

            Self::TooManyRequests => ErrorKind::RateLimited,

            Self::Unknown
            | Self::InviteCodeExhausted
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => ErrorKind::Internal,

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::InvalidFormat
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::InvalidPrivacyLevel
            | Self::InvalidWorshipType
            | Self::InvalidFamilyRole
            | Self::InvalidReminderType
            | Self::InvalidPermissionType
            | Self::GenealogyParentInvalid
            | Self::GenealogyCycle
            | Self::InvalidGender
            | Self::InvalidStoryCategory
            | Self::InvalidTraditionCategory
            | Self::InvalidActivityContent => ErrorKind::Validation,
        }
    }
}
