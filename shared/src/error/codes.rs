//! Unified error codes for memorial-cloud
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Memorial errors
//! - 4xxx: Family errors
//! - 5xxx: Privacy errors
//! - 6xxx: Genealogy and heritage errors
//! - 7xxx: Activity errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests from the same client
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// User not found
    UserNotFound = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Memorial ====================
    /// Memorial not found (or soft-deleted)
    MemorialNotFound = 3001,
    /// Memorial exists but the actor may not see or act on it
    MemorialAccessDenied = 3002,
    /// Merged external form of not-found / access-denied
    MemorialUnavailable = 3003,
    /// Only the memorial creator may do this
    MemorialOwnerRequired = 3004,
    /// Privacy level outside 0..=2
    InvalidPrivacyLevel = 3005,
    /// Unknown worship type
    InvalidWorshipType = 3006,

    // ==================== 4xxx: Family ====================
    /// Family not found
    FamilyNotFound = 4001,
    /// Actor is not a member of the family
    NotFamilyMember = 4002,
    /// Family admin role required
    FamilyAdminRequired = 4003,
    /// Only the family creator may do this
    FamilyCreatorRequired = 4004,
    /// User is already a member of the family
    AlreadyFamilyMember = 4005,
    /// Target user is not a member of the family
    FamilyMemberNotFound = 4006,
    /// The family creator cannot be removed
    CannotRemoveCreator = 4007,
    /// The family creator cannot leave
    CreatorCannotLeave = 4008,
    /// The family creator's role cannot change
    CannotChangeCreatorRole = 4009,
    /// Role string is not admin/member
    InvalidFamilyRole = 4010,
    /// No family matches the invite code
    InvalidInviteCode = 4011,
    /// Could not allocate a unique invite code
    InviteCodeExhausted = 4012,
    /// Invitation not found
    InvitationNotFound = 4101,
    /// Invitation has expired
    InvitationExpired = 4102,
    /// Invitation was already accepted or declined
    InvitationHandled = 4103,
    /// Memorial is already linked to the family
    MemorialAlreadyLinked = 4201,
    /// Memorial is not linked to the family
    MemorialNotLinked = 4202,
    /// Reminder not found
    ReminderNotFound = 4301,
    /// Unknown reminder type
    InvalidReminderType = 4302,

    // ==================== 5xxx: Privacy ====================
    /// Unknown permission type
    InvalidPermissionType = 5001,
    /// Access request not found
    AccessRequestNotFound = 5002,
    /// A pending access request already exists
    AccessRequestPending = 5003,
    /// Access request was already approved or rejected
    AccessRequestHandled = 5004,
    /// User is already blacklisted on the memorial
    AlreadyBlacklisted = 5005,
    /// User is blacklisted on the memorial
    UserBlacklisted = 5006,
    /// The memorial creator cannot be blacklisted
    CannotBlacklistOwner = 5007,
    /// The memorial creator cannot request access to their own memorial
    OwnerCannotRequestAccess = 5008,

    // ==================== 6xxx: Genealogy / Heritage ====================
    /// Genealogy node not found
    GenealogyNotFound = 6001,
    /// Parent node missing or in another family
    GenealogyParentInvalid = 6002,
    /// Node still has children
    GenealogyHasChildren = 6003,
    /// Update would make a node its own ancestor
    GenealogyCycle = 6004,
    /// Unknown gender value
    InvalidGender = 6005,
    /// Story not found
    StoryNotFound = 6101,
    /// Unknown story category
    InvalidStoryCategory = 6102,
    /// Tradition not found
    TraditionNotFound = 6201,
    /// Unknown tradition category
    InvalidTraditionCategory = 6202,

    // ==================== 7xxx: Activity ====================
    /// Activity not found
    ActivityNotFound = 7001,
    /// Activity content does not decode
    InvalidActivityContent = 7002,
    /// Collective worship is no longer active
    CollectiveWorshipClosed = 7003,
    /// User already joined the collective worship
    AlreadyParticipating = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::UserNotFound => "User not found",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Memorial
            ErrorCode::MemorialNotFound => "Memorial not found",
            ErrorCode::MemorialAccessDenied => "No access to this memorial",
            ErrorCode::MemorialUnavailable => "Memorial does not exist or you have no access",
            ErrorCode::MemorialOwnerRequired => "Only the memorial creator can do this",
            ErrorCode::InvalidPrivacyLevel => "Privacy level must be 0, 1 or 2",
            ErrorCode::InvalidWorshipType => "Invalid worship type",

            // Family
            ErrorCode::FamilyNotFound => "Family not found",
            ErrorCode::NotFamilyMember => "You are not a member of this family",
            ErrorCode::FamilyAdminRequired => "Family administrator role is required",
            ErrorCode::FamilyCreatorRequired => "Only the family creator can do this",
            ErrorCode::AlreadyFamilyMember => "Already a member of this family",
            ErrorCode::FamilyMemberNotFound => "Family member not found",
            ErrorCode::CannotRemoveCreator => "The family creator cannot be removed",
            ErrorCode::CreatorCannotLeave => "The family creator cannot leave the family",
            ErrorCode::CannotChangeCreatorRole => "The family creator's role cannot be changed",
            ErrorCode::InvalidFamilyRole => "Role must be admin or member",
            ErrorCode::InvalidInviteCode => "Invalid invite code",
            ErrorCode::InviteCodeExhausted => "Could not allocate a unique invite code",
            ErrorCode::InvitationNotFound => "Invitation not found",
            ErrorCode::InvitationExpired => "Invitation has expired",
            ErrorCode::InvitationHandled => "Invitation has already been handled",
            ErrorCode::MemorialAlreadyLinked => "Memorial is already linked to this family",
            ErrorCode::MemorialNotLinked => "Memorial is not linked to this family",
            ErrorCode::ReminderNotFound => "Reminder not found",
            ErrorCode::InvalidReminderType => "Invalid reminder type",

            // Privacy
            ErrorCode::InvalidPermissionType => "Invalid permission type",
            ErrorCode::AccessRequestNotFound => "Access request not found",
            ErrorCode::AccessRequestPending => "An access request is already pending",
            ErrorCode::AccessRequestHandled => "Access request has already been handled",
            ErrorCode::AlreadyBlacklisted => "User is already blacklisted",
            ErrorCode::UserBlacklisted => "You have been blocked from this memorial",
            ErrorCode::CannotBlacklistOwner => "The memorial creator cannot be blacklisted",
            ErrorCode::OwnerCannotRequestAccess => "The memorial creator already has access",

            // Genealogy / Heritage
            ErrorCode::GenealogyNotFound => "Genealogy record not found",
            ErrorCode::GenealogyParentInvalid => "Parent record does not exist in this family",
            ErrorCode::GenealogyHasChildren => "Genealogy record has children and cannot be deleted",
            ErrorCode::GenealogyCycle => "A record cannot be its own ancestor",
            ErrorCode::InvalidGender => "Gender must be male or female",
            ErrorCode::StoryNotFound => "Story not found",
            ErrorCode::InvalidStoryCategory => "Invalid story category",
            ErrorCode::TraditionNotFound => "Tradition not found",
            ErrorCode::InvalidTraditionCategory => "Invalid tradition category",

            // Activity
            ErrorCode::ActivityNotFound => "Activity not found",
            ErrorCode::InvalidActivityContent => "Activity content is malformed",
            ErrorCode::CollectiveWorshipClosed => "Collective worship has ended",
            ErrorCode::AlreadyParticipating => "Already joined this collective worship",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::UserNotFound),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Memorial
            3001 => Ok(ErrorCode::MemorialNotFound),
            3002 => Ok(ErrorCode::MemorialAccessDenied),
            3003 => Ok(ErrorCode::MemorialUnavailable),
            3004 => Ok(ErrorCode::MemorialOwnerRequired),
            3005 => Ok(ErrorCode::InvalidPrivacyLevel),
            3006 => Ok(ErrorCode::InvalidWorshipType),

            // Family
            4001 => Ok(ErrorCode::FamilyNotFound),
            4002 => Ok(ErrorCode::NotFamilyMember),
            4003 => Ok(ErrorCode::FamilyAdminRequired),
            4004 => Ok(ErrorCode::FamilyCreatorRequired),
            4005 => Ok(ErrorCode::AlreadyFamilyMember),
            4006 => Ok(ErrorCode::FamilyMemberNotFound),
            4007 => Ok(ErrorCode::CannotRemoveCreator),
            4008 => Ok(ErrorCode::CreatorCannotLeave),
            4009 => Ok(ErrorCode::CannotChangeCreatorRole),
            4010 => Ok(ErrorCode::InvalidFamilyRole),
            4011 => Ok(ErrorCode::InvalidInviteCode),
            4012 => Ok(ErrorCode::InviteCodeExhausted),
            4101 => Ok(ErrorCode::InvitationNotFound),
            4102 => Ok(ErrorCode::InvitationExpired),
            4103 => Ok(ErrorCode::InvitationHandled),
            4201 => Ok(ErrorCode::MemorialAlreadyLinked),
            4202 => Ok(ErrorCode::MemorialNotLinked),
            4301 => Ok(ErrorCode::ReminderNotFound),
            4302 => Ok(ErrorCode::InvalidReminderType),

            // Privacy
            5001 => Ok(ErrorCode::InvalidPermissionType),
            5002 => Ok(ErrorCode::AccessRequestNotFound),
            5003 => Ok(ErrorCode::AccessRequestPending),
            5004 => Ok(ErrorCode::AccessRequestHandled),
            5005 => Ok(ErrorCode::AlreadyBlacklisted),
            5006 => Ok(ErrorCode::UserBlacklisted),
            5007 => Ok(ErrorCode::CannotBlacklistOwner),
            5008 => Ok(ErrorCode::OwnerCannotRequestAccess),

            // Genealogy / Heritage
            6001 => Ok(ErrorCode::GenealogyNotFound),
            6002 => Ok(ErrorCode::GenealogyParentInvalid),
            6003 => Ok(ErrorCode::GenealogyHasChildren),
            6004 => Ok(ErrorCode::GenealogyCycle),
            6005 => Ok(ErrorCode::InvalidGender),
            6101 => Ok(ErrorCode::StoryNotFound),
            6102 => Ok(ErrorCode::InvalidStoryCategory),
            6201 => Ok(ErrorCode::TraditionNotFound),
            6202 => Ok(ErrorCode::InvalidTraditionCategory),

            // Activity
            7001 => Ok(ErrorCode::ActivityNotFound),
            7002 => Ok(ErrorCode::InvalidActivityContent),
            7003 => Ok(ErrorCode::CollectiveWorshipClosed),
            7004 => Ok(ErrorCode::AlreadyParticipating),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::MemorialNotFound.code(), 3001);
        assert_eq!(ErrorCode::FamilyNotFound.code(), 4001);
        assert_eq!(ErrorCode::AccessRequestPending.code(), 5003);
        assert_eq!(ErrorCode::GenealogyHasChildren.code(), 6003);
        assert_eq!(ErrorCode::AlreadyParticipating.code(), 7004);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::MemorialUnavailable).unwrap();
        assert_eq!(json, "3003");

        let json = serde_json::to_string(&ErrorCode::Success).unwrap();
        assert_eq!(json, "0");
    }

    #[test]
    fn test_deserialize() {
        let code: ErrorCode = serde_json::from_str("4102").unwrap();
        assert_eq!(code, ErrorCode::InvitationExpired);

        let code: ErrorCode = serde_json::from_str("9001").unwrap();
        assert_eq!(code, ErrorCode::InternalError);
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::FamilyAdminRequired), "4003");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(
            ErrorCode::AccessRequestPending.message(),
            "An access request is already pending"
        );
    }

    #[test]
    fn test_invalid_error_code_display() {
        let err = InvalidErrorCode(999);
        assert_eq!(format!("{}", err), "invalid error code: 999");
    }

    #[test]
    fn test_every_code_converts_back() {
        let codes = [
            ErrorCode::TooManyRequests,
            ErrorCode::UserNotFound,
            ErrorCode::MemorialOwnerRequired,
            ErrorCode::InviteCodeExhausted,
            ErrorCode::MemorialNotLinked,
            ErrorCode::OwnerCannotRequestAccess,
            ErrorCode::InvalidTraditionCategory,
            ErrorCode::CollectiveWorshipClosed,
            ErrorCode::ConfigError,
        ];

        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }
}
