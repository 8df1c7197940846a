//! Entity store
//!
//! Repository traits per area, combined into [`Store`]. Services hold an
//! `Arc<dyn Store>`; [`postgres::PgStore`] backs production and
//! [`memory::MemoryStore`] backs tests and database-less development runs.
//!
//! Every method that must be atomic (family + creator membership, family
//! cascade delete, privacy replacement, ...) is a single call here: a
//! transaction in Postgres, one write-lock section in memory.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use shared::models::{
    AccessRequest, AccessRequestStatus, BlacklistEntry, CollectiveWorshipParticipant, Family,
    FamilyActivity, FamilyInvitation, FamilyMember, FamilyRole, FamilyStory, FamilyTradition,
    GenealogyNode, InvitationStatus, Memorial, MemorialFamily, MemorialReminder, PermissionType,
    PrivacyLevel, StoryCategory, TraditionCategory, User, VisitorPermission, VisitorRecord,
    WorshipRecord,
};
use thiserror::Error;

/// Store-level failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violated (constraint name)
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    /// Foreign key violated (constraint name)
    #[error("referenced entry: {0}")]
    Referenced(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Constraint violations surface as their own variants
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => return StoreError::Duplicate(constraint),
                Some("23503") => return StoreError::Referenced(constraint),
                _ => {}
            }
        }
        StoreError::Database(e)
    }
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of rows plus the unpaged total
pub type Page<T> = (Vec<T>, i64);

/// Result of answering an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationOutcome {
    /// The invitation was no longer pending; nothing changed
    NotPending,
    /// Status transitioned; `joined` is true if a member row was inserted
    Responded { joined: bool },
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait MemorialRepo: Send + Sync {
    async fn insert_memorial(&self, memorial: &Memorial) -> StoreResult<()>;
    /// Soft-deleted memorials are absent
    async fn find_active_memorial(&self, id: &str) -> StoreResult<Option<Memorial>>;
    /// Writes the descriptive fields and `updated_at`
    async fn update_memorial(&self, memorial: &Memorial) -> StoreResult<()>;
    async fn soft_delete_memorial(&self, id: &str, now: i64) -> StoreResult<bool>;
    /// Active memorials created by the user or linked to one of the user's families
    async fn list_accessible_memorials(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Memorial>>;
    async fn insert_worship_record(&self, record: &WorshipRecord) -> StoreResult<()>;
    /// Inserts unless the visitor already has a visit at or after `since`
    async fn record_visit(&self, visit: &VisitorRecord, since: i64) -> StoreResult<bool>;
    async fn list_visitors(
        &self,
        memorial_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<VisitorRecord>>;
    async fn delete_visitors_before(&self, memorial_id: &str, cutoff: i64) -> StoreResult<u64>;
}

#[async_trait]
pub trait FamilyRepo: Send + Sync {
    /// Family row and the creator's admin row, both or neither
    async fn create_family(&self, family: &Family, creator: &FamilyMember) -> StoreResult<()>;
    async fn find_family(&self, id: &str) -> StoreResult<Option<Family>>;
    async fn find_family_by_code(&self, invite_code: &str) -> StoreResult<Option<Family>>;
    async fn list_user_families(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Family>>;
    async fn update_family(&self, family: &Family) -> StoreResult<()>;
    /// Removes the family and everything scoped to it
    async fn delete_family(&self, id: &str) -> StoreResult<()>;

    async fn find_member(&self, family_id: &str, user_id: &str)
    -> StoreResult<Option<FamilyMember>>;
    async fn insert_member(&self, member: &FamilyMember) -> StoreResult<()>;
    /// Never deletes the creator's row
    async fn delete_member(&self, family_id: &str, user_id: &str) -> StoreResult<bool>;
    async fn update_member_role(
        &self,
        family_id: &str,
        user_id: &str,
        role: FamilyRole,
    ) -> StoreResult<bool>;
    /// Admins first, then by join time
    async fn list_members(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyMember>>;

    async fn link_memorial(&self, link: &MemorialFamily) -> StoreResult<()>;
    async fn unlink_memorial(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool>;
    async fn is_memorial_linked(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool>;
    async fn list_family_memorials(&self, family_id: &str) -> StoreResult<Vec<Memorial>>;
    /// Families linked to the memorial in which the user is a member
    async fn member_family_ids_for_memorial(
        &self,
        memorial_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<String>>;

    /// A pending or accepted invitation exists for the pair
    async fn has_open_invitation(&self, family_id: &str, invitee_id: &str) -> StoreResult<bool>;
    async fn insert_invitations(&self, invitations: &[FamilyInvitation]) -> StoreResult<()>;
    async fn find_invitation(&self, id: &str) -> StoreResult<Option<FamilyInvitation>>;
    async fn list_pending_invitations(
        &self,
        invitee_id: &str,
        now: i64,
    ) -> StoreResult<Vec<FamilyInvitation>>;
    /// Transitions a pending invitation; with `member`, also inserts it unless
    /// the user is already a member
    async fn respond_invitation(
        &self,
        id: &str,
        status: InvitationStatus,
        member: Option<&FamilyMember>,
        now: i64,
    ) -> StoreResult<InvitationOutcome>;
}

#[async_trait]
pub trait PrivacyRepo: Send + Sync {
    /// Sets the level and replaces every grant and blacklist entry
    async fn replace_privacy(
        &self,
        memorial_id: &str,
        level: PrivacyLevel,
        grants: &[VisitorPermission],
        blacklist: &[BlacklistEntry],
        now: i64,
    ) -> StoreResult<()>;
    async fn list_grants(&self, memorial_id: &str) -> StoreResult<Vec<VisitorPermission>>;
    async fn has_user_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool>;
    /// Grant to any family the user belongs to
    async fn has_family_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool>;

    async fn is_blacklisted(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool>;
    async fn list_blacklist(&self, memorial_id: &str) -> StoreResult<Vec<BlacklistEntry>>;
    /// Inserts the entry and drops the user's user-scoped grants
    async fn add_to_blacklist(&self, entry: &BlacklistEntry) -> StoreResult<()>;
    async fn remove_from_blacklist(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool>;

    /// Fails with `Duplicate` while another request for the pair is pending
    async fn insert_access_request(&self, request: &AccessRequest) -> StoreResult<()>;
    async fn find_access_request(&self, id: &str) -> StoreResult<Option<AccessRequest>>;
    async fn list_access_requests(
        &self,
        memorial_id: &str,
        status: Option<AccessRequestStatus>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<AccessRequest>>;
    /// Transitions a pending request and inserts `grants`; false if not pending
    async fn resolve_access_request(
        &self,
        id: &str,
        status: AccessRequestStatus,
        grants: &[VisitorPermission],
        now: i64,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait GenealogyRepo: Send + Sync {
    async fn insert_genealogy(&self, node: &GenealogyNode) -> StoreResult<()>;
    async fn find_genealogy(&self, id: &str) -> StoreResult<Option<GenealogyNode>>;
    async fn update_genealogy(&self, node: &GenealogyNode) -> StoreResult<()>;
    /// Ordered by generation, then name
    async fn list_genealogy(&self, family_id: &str) -> StoreResult<Vec<GenealogyNode>>;
    async fn has_children(&self, id: &str) -> StoreResult<bool>;
    /// `Referenced` if a child appeared concurrently
    async fn delete_genealogy(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait HeritageRepo: Send + Sync {
    async fn insert_story(&self, story: &FamilyStory) -> StoreResult<()>;
    async fn find_story(&self, id: &str) -> StoreResult<Option<FamilyStory>>;
    async fn update_story(&self, story: &FamilyStory) -> StoreResult<()>;
    async fn delete_story(&self, id: &str) -> StoreResult<bool>;
    async fn list_stories(
        &self,
        family_id: &str,
        category: Option<StoryCategory>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyStory>>;
    async fn increment_story_views(&self, id: &str) -> StoreResult<()>;

    async fn insert_tradition(&self, tradition: &FamilyTradition) -> StoreResult<()>;
    async fn find_tradition(&self, id: &str) -> StoreResult<Option<FamilyTradition>>;
    async fn update_tradition(&self, tradition: &FamilyTradition) -> StoreResult<()>;
    async fn delete_tradition(&self, id: &str) -> StoreResult<bool>;
    async fn list_traditions(
        &self,
        family_id: &str,
        category: Option<TraditionCategory>,
    ) -> StoreResult<Vec<FamilyTradition>>;
}

#[async_trait]
pub trait ReminderRepo: Send + Sync {
    async fn insert_reminder(&self, reminder: &MemorialReminder) -> StoreResult<()>;
    async fn find_reminder(&self, id: &str) -> StoreResult<Option<MemorialReminder>>;
    /// Active reminders, ordered by date; bounds are inclusive
    async fn list_reminders(
        &self,
        family_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<MemorialReminder>>;
    async fn deactivate_reminder(&self, id: &str, now: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ActivityRepo: Send + Sync {
    async fn insert_activity(&self, activity: &FamilyActivity) -> StoreResult<()>;
    async fn find_activity(&self, id: &str) -> StoreResult<Option<FamilyActivity>>;
    /// Newest first
    async fn list_activities(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyActivity>>;
    /// Activity row plus the initiator's participant row
    async fn create_collective_worship(
        &self,
        activity: &FamilyActivity,
        initiator: &CollectiveWorshipParticipant,
    ) -> StoreResult<()>;
    /// Insert-or-ignore; false if the user was already a participant
    async fn add_participant(&self, participant: &CollectiveWorshipParticipant)
    -> StoreResult<bool>;
    async fn list_participants(
        &self,
        activity_id: &str,
    ) -> StoreResult<Vec<CollectiveWorshipParticipant>>;
    async fn update_activity_content(&self, id: &str, content: &Value) -> StoreResult<bool>;
}

/// The full entity store
pub trait Store:
    UserRepo
    + MemorialRepo
    + FamilyRepo
    + PrivacyRepo
    + GenealogyRepo
    + HeritageRepo
    + ReminderRepo
    + ActivityRepo
{
}

impl<T> Store for T where
    T: UserRepo
        + MemorialRepo
        + FamilyRepo
        + PrivacyRepo
        + GenealogyRepo
        + HeritageRepo
        + ReminderRepo
        + ActivityRepo
{
}
