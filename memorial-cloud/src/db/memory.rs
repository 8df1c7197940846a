//! In-memory store
//!
//! Mirrors the Postgres schema constraints (unique keys, partial unique
//! index on pending access requests, genealogy parent references) so the
//! services behave the same against either backend. One lock guards every
//! table, so each trait method is atomic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use shared::models::{
    AccessRequest, AccessRequestStatus, BlacklistEntry, CollectiveWorshipParticipant, Family,
    FamilyActivity, FamilyInvitation, FamilyMember, FamilyRole, FamilyStory, FamilyTradition,
    GenealogyNode, InvitationStatus, Memorial, MemorialFamily, MemorialReminder, MemorialStatus,
    PermissionType, PrivacyLevel, StoryCategory, TraditionCategory, User, VisitorPermission,
    VisitorRecord, WorshipRecord,
};
use tokio::sync::RwLock;

use super::{
    ActivityRepo, FamilyRepo, GenealogyRepo, HeritageRepo, InvitationOutcome, MemorialRepo, Page,
    PrivacyRepo, ReminderRepo, StoreError, StoreResult, UserRepo,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    memorials: HashMap<String, Memorial>,
    worship_records: Vec<WorshipRecord>,
    visitors: Vec<VisitorRecord>,
    families: HashMap<String, Family>,
    members: Vec<FamilyMember>,
    memorial_families: Vec<MemorialFamily>,
    invitations: HashMap<String, FamilyInvitation>,
    grants: Vec<VisitorPermission>,
    blacklist: Vec<BlacklistEntry>,
    access_requests: HashMap<String, AccessRequest>,
    genealogy: HashMap<String, GenealogyNode>,
    stories: HashMap<String, FamilyStory>,
    traditions: HashMap<String, FamilyTradition>,
    reminders: HashMap<String, MemorialReminder>,
    activities: HashMap<String, FamilyActivity>,
    participants: Vec<CollectiveWorshipParticipant>,
}

impl Tables {
    fn is_member(&self, family_id: &str, user_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.family_id == family_id && m.user_id == user_id)
    }

    fn insert_member(&mut self, member: &FamilyMember) -> StoreResult<()> {
        if self.is_member(&member.family_id, &member.user_id) {
            return Err(StoreError::Duplicate(
                "family_members_family_id_user_id_key".into(),
            ));
        }
        self.members.push(member.clone());
        Ok(())
    }

    fn insert_blacklist(&mut self, entry: &BlacklistEntry) -> StoreResult<()> {
        if !self.users.contains_key(&entry.user_id) {
            return Err(StoreError::Referenced("visitor_blacklist_user_id_fkey".into()));
        }
        if self
            .blacklist
            .iter()
            .any(|b| b.memorial_id == entry.memorial_id && b.user_id == entry.user_id)
        {
            return Err(StoreError::Duplicate(
                "visitor_blacklist_memorial_id_user_id_key".into(),
            ));
        }
        self.blacklist.push(entry.clone());
        Ok(())
    }
}

fn paginate<T>(rows: Vec<T>, offset: i64, limit: i64) -> Page<T> {
    let total = rows.len() as i64;
    let page = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (page, total)
}

/// Store kept entirely in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate("users_pkey".into()));
        }
        t.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }
}

#[async_trait]
impl MemorialRepo for MemoryStore {
    async fn insert_memorial(&self, memorial: &Memorial) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.memorials.insert(memorial.id.clone(), memorial.clone());
        Ok(())
    }

    async fn find_active_memorial(&self, id: &str) -> StoreResult<Option<Memorial>> {
        let t = self.tables.read().await;
        Ok(t.memorials.get(id).filter(|m| m.is_active()).cloned())
    }

    async fn update_memorial(&self, memorial: &Memorial) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(m) = t.memorials.get_mut(&memorial.id).filter(|m| m.is_active()) {
            m.deceased_name = memorial.deceased_name.clone();
            m.biography = memorial.biography.clone();
            m.avatar_url = memorial.avatar_url.clone();
            m.epitaph = memorial.epitaph.clone();
            m.birth_date = memorial.birth_date;
            m.death_date = memorial.death_date;
            m.updated_at = memorial.updated_at;
        }
        Ok(())
    }

    async fn soft_delete_memorial(&self, id: &str, now: i64) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.memorials.get_mut(id).filter(|m| m.is_active()) {
            Some(m) => {
                m.status = MemorialStatus::Deleted;
                m.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_accessible_memorials(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Memorial>> {
        let t = self.tables.read().await;
        let mut rows: Vec<Memorial> = t
            .memorials
            .values()
            .filter(|m| m.is_active())
            .filter(|m| {
                m.creator_id == user_id
                    || t.memorial_families
                        .iter()
                        .any(|link| link.memorial_id == m.id && t.is_member(&link.family_id, user_id))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, offset, limit))
    }

    async fn insert_worship_record(&self, record: &WorshipRecord) -> StoreResult<()> {
        self.tables.write().await.worship_records.push(record.clone());
        Ok(())
    }

    async fn record_visit(&self, visit: &VisitorRecord, since: i64) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let seen = t.visitors.iter().any(|v| {
            v.memorial_id == visit.memorial_id
                && v.visitor_id == visit.visitor_id
                && v.visited_at >= since
        });
        if seen {
            return Ok(false);
        }
        t.visitors.push(visit.clone());
        Ok(true)
    }

    async fn list_visitors(
        &self,
        memorial_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<VisitorRecord>> {
        let t = self.tables.read().await;
        let mut rows: Vec<VisitorRecord> = t
            .visitors
            .iter()
            .filter(|v| v.memorial_id == memorial_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(paginate(rows, offset, limit))
    }

    async fn delete_visitors_before(&self, memorial_id: &str, cutoff: i64) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let before = t.visitors.len();
        t.visitors
            .retain(|v| !(v.memorial_id == memorial_id && v.visited_at < cutoff));
        Ok((before - t.visitors.len()) as u64)
    }
}

#[async_trait]
impl FamilyRepo for MemoryStore {
    async fn create_family(&self, family: &Family, creator: &FamilyMember) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.families.values().any(|f| f.invite_code == family.invite_code) {
            return Err(StoreError::Duplicate("families_invite_code_key".into()));
        }
        if t.is_member(&creator.family_id, &creator.user_id) {
            return Err(StoreError::Duplicate(
                "family_members_family_id_user_id_key".into(),
            ));
        }
        t.families.insert(family.id.clone(), family.clone());
        t.members.push(creator.clone());
        Ok(())
    }

    async fn find_family(&self, id: &str) -> StoreResult<Option<Family>> {
        Ok(self.tables.read().await.families.get(id).cloned())
    }

    async fn find_family_by_code(&self, invite_code: &str) -> StoreResult<Option<Family>> {
        let t = self.tables.read().await;
        Ok(t.families
            .values()
            .find(|f| f.invite_code == invite_code)
            .cloned())
    }

    async fn list_user_families(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Family>> {
        let t = self.tables.read().await;
        let mut joined: Vec<&FamilyMember> =
            t.members.iter().filter(|m| m.user_id == user_id).collect();
        joined.sort_by(|a, b| b.joined_at.cmp(&a.joined_at));
        let rows = joined
            .into_iter()
            .filter_map(|m| t.families.get(&m.family_id).cloned())
            .collect();
        Ok(paginate(rows, offset, limit))
    }

    async fn update_family(&self, family: &Family) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(f) = t.families.get_mut(&family.id) {
            f.name = family.name.clone();
            f.description = family.description.clone();
            f.updated_at = family.updated_at;
        }
        Ok(())
    }

    async fn delete_family(&self, id: &str) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let activity_ids: Vec<String> = t
            .activities
            .values()
            .filter(|a| a.family_id == id)
            .map(|a| a.id.clone())
            .collect();
        t.participants
            .retain(|p| !activity_ids.contains(&p.activity_id));
        t.activities.retain(|_, a| a.family_id != id);
        t.reminders.retain(|_, r| r.family_id != id);
        t.traditions.retain(|_, tr| tr.family_id != id);
        t.stories.retain(|_, s| s.family_id != id);
        t.genealogy.retain(|_, n| n.family_id != id);
        t.grants.retain(|g| g.family_id.as_deref() != Some(id));
        t.invitations.retain(|_, inv| inv.family_id != id);
        t.memorial_families.retain(|l| l.family_id != id);
        t.members.retain(|m| m.family_id != id);
        t.families.remove(id);
        Ok(())
    }

    async fn find_member(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<FamilyMember>> {
        let t = self.tables.read().await;
        Ok(t.members
            .iter()
            .find(|m| m.family_id == family_id && m.user_id == user_id)
            .cloned())
    }

    async fn insert_member(&self, member: &FamilyMember) -> StoreResult<()> {
        self.tables.write().await.insert_member(member)
    }

    async fn delete_member(&self, family_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let is_creator = t
            .families
            .get(family_id)
            .is_some_and(|f| f.creator_id == user_id);
        if is_creator {
            return Ok(false);
        }
        let before = t.members.len();
        t.members
            .retain(|m| !(m.family_id == family_id && m.user_id == user_id));
        Ok(t.members.len() < before)
    }

    async fn update_member_role(
        &self,
        family_id: &str,
        user_id: &str,
        role: FamilyRole,
    ) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t
            .members
            .iter_mut()
            .find(|m| m.family_id == family_id && m.user_id == user_id)
        {
            Some(m) => {
                m.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_members(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyMember>> {
        let t = self.tables.read().await;
        let mut rows: Vec<FamilyMember> = t
            .members
            .iter()
            .filter(|m| m.family_id == family_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.role
                .is_admin()
                .cmp(&a.role.is_admin())
                .then(a.joined_at.cmp(&b.joined_at))
        });
        Ok(paginate(rows, offset, limit))
    }

    async fn link_memorial(&self, link: &MemorialFamily) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.memorial_families
            .iter()
            .any(|l| l.memorial_id == link.memorial_id && l.family_id == link.family_id)
        {
            return Err(StoreError::Duplicate(
                "memorial_families_memorial_id_family_id_key".into(),
            ));
        }
        t.memorial_families.push(link.clone());
        Ok(())
    }

    async fn unlink_memorial(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.memorial_families.len();
        t.memorial_families
            .retain(|l| !(l.family_id == family_id && l.memorial_id == memorial_id));
        Ok(t.memorial_families.len() < before)
    }

    async fn is_memorial_linked(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.memorial_families
            .iter()
            .any(|l| l.family_id == family_id && l.memorial_id == memorial_id))
    }

    async fn list_family_memorials(&self, family_id: &str) -> StoreResult<Vec<Memorial>> {
        let t = self.tables.read().await;
        let mut links: Vec<&MemorialFamily> = t
            .memorial_families
            .iter()
            .filter(|l| l.family_id == family_id)
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(links
            .into_iter()
            .filter_map(|l| t.memorials.get(&l.memorial_id))
            .filter(|m| m.is_active())
            .cloned()
            .collect())
    }

    async fn member_family_ids_for_memorial(
        &self,
        memorial_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<String>> {
        let t = self.tables.read().await;
        Ok(t.memorial_families
            .iter()
            .filter(|l| l.memorial_id == memorial_id && t.is_member(&l.family_id, user_id))
            .map(|l| l.family_id.clone())
            .collect())
    }

    async fn has_open_invitation(&self, family_id: &str, invitee_id: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.invitations.values().any(|inv| {
            inv.family_id == family_id
                && inv.invitee_id == invitee_id
                && matches!(
                    inv.status,
                    InvitationStatus::Pending | InvitationStatus::Accepted
                )
        }))
    }

    async fn insert_invitations(&self, invitations: &[FamilyInvitation]) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        for inv in invitations {
            t.invitations.insert(inv.id.clone(), inv.clone());
        }
        Ok(())
    }

    async fn find_invitation(&self, id: &str) -> StoreResult<Option<FamilyInvitation>> {
        Ok(self.tables.read().await.invitations.get(id).cloned())
    }

    async fn list_pending_invitations(
        &self,
        invitee_id: &str,
        now: i64,
    ) -> StoreResult<Vec<FamilyInvitation>> {
        let t = self.tables.read().await;
        let mut rows: Vec<FamilyInvitation> = t
            .invitations
            .values()
            .filter(|inv| {
                inv.invitee_id == invitee_id
                    && inv.status == InvitationStatus::Pending
                    && !inv.is_expired(now)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn respond_invitation(
        &self,
        id: &str,
        status: InvitationStatus,
        member: Option<&FamilyMember>,
        now: i64,
    ) -> StoreResult<InvitationOutcome> {
        let mut t = self.tables.write().await;
        match t.invitations.get_mut(id) {
            Some(inv) if inv.status == InvitationStatus::Pending => {
                inv.status = status;
                inv.updated_at = now;
            }
            _ => return Ok(InvitationOutcome::NotPending),
        }

        let mut joined = false;
        if let Some(member) = member
            && !t.is_member(&member.family_id, &member.user_id)
        {
            t.members.push(member.clone());
            joined = true;
        }
        Ok(InvitationOutcome::Responded { joined })
    }
}

#[async_trait]
impl PrivacyRepo for MemoryStore {
    async fn replace_privacy(
        &self,
        memorial_id: &str,
        level: PrivacyLevel,
        grants: &[VisitorPermission],
        blacklist: &[BlacklistEntry],
        now: i64,
    ) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        // Reject dangling ids before touching anything
        for grant in grants {
            if grant
                .family_id
                .as_ref()
                .is_some_and(|id| !t.families.contains_key(id))
            {
                return Err(StoreError::Referenced(
                    "visitor_permissions_family_id_fkey".into(),
                ));
            }
            if grant
                .user_id
                .as_ref()
                .is_some_and(|id| !t.users.contains_key(id))
            {
                return Err(StoreError::Referenced(
                    "visitor_permissions_user_id_fkey".into(),
                ));
            }
        }
        if blacklist.iter().any(|b| !t.users.contains_key(&b.user_id)) {
            return Err(StoreError::Referenced("visitor_blacklist_user_id_fkey".into()));
        }
        if let Some(m) = t.memorials.get_mut(memorial_id) {
            m.privacy_level = level;
            m.updated_at = now;
        }
        t.grants.retain(|g| g.memorial_id != memorial_id);
        t.blacklist.retain(|b| b.memorial_id != memorial_id);
        t.grants.extend(grants.iter().cloned());
        for entry in blacklist {
            t.insert_blacklist(entry)?;
        }
        Ok(())
    }

    async fn list_grants(&self, memorial_id: &str) -> StoreResult<Vec<VisitorPermission>> {
        let t = self.tables.read().await;
        let mut rows: Vec<VisitorPermission> = t
            .grants
            .iter()
            .filter(|g| g.memorial_id == memorial_id)
            .cloned()
            .collect();
        rows.sort_by_key(|g| g.created_at);
        Ok(rows)
    }

    async fn has_user_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.grants.iter().any(|g| {
            g.memorial_id == memorial_id
                && g.user_id.as_deref() == Some(user_id)
                && g.permission_type == permission
                && g.is_allowed
        }))
    }

    async fn has_family_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.grants.iter().any(|g| {
            g.memorial_id == memorial_id
                && g.permission_type == permission
                && g.is_allowed
                && g.family_id
                    .as_deref()
                    .is_some_and(|family_id| t.is_member(family_id, user_id))
        }))
    }

    async fn is_blacklisted(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.blacklist
            .iter()
            .any(|b| b.memorial_id == memorial_id && b.user_id == user_id))
    }

    async fn list_blacklist(&self, memorial_id: &str) -> StoreResult<Vec<BlacklistEntry>> {
        let t = self.tables.read().await;
        let mut rows: Vec<BlacklistEntry> = t
            .blacklist
            .iter()
            .filter(|b| b.memorial_id == memorial_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn add_to_blacklist(&self, entry: &BlacklistEntry) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.insert_blacklist(entry)?;
        t.grants.retain(|g| {
            !(g.memorial_id == entry.memorial_id
                && g.user_id.as_deref() == Some(entry.user_id.as_str()))
        });
        Ok(())
    }

    async fn remove_from_blacklist(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.blacklist.len();
        t.blacklist
            .retain(|b| !(b.memorial_id == memorial_id && b.user_id == user_id));
        Ok(t.blacklist.len() < before)
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let pending = t.access_requests.values().any(|r| {
            r.memorial_id == request.memorial_id
                && r.user_id == request.user_id
                && r.status == AccessRequestStatus::Pending
        });
        if pending && request.status == AccessRequestStatus::Pending {
            return Err(StoreError::Duplicate("uq_access_requests_pending".into()));
        }
        t.access_requests
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn find_access_request(&self, id: &str) -> StoreResult<Option<AccessRequest>> {
        Ok(self.tables.read().await.access_requests.get(id).cloned())
    }

    async fn list_access_requests(
        &self,
        memorial_id: &str,
        status: Option<AccessRequestStatus>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<AccessRequest>> {
        let t = self.tables.read().await;
        let mut rows: Vec<AccessRequest> = t
            .access_requests
            .values()
            .filter(|r| r.memorial_id == memorial_id)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, offset, limit))
    }

    async fn resolve_access_request(
        &self,
        id: &str,
        status: AccessRequestStatus,
        grants: &[VisitorPermission],
        now: i64,
    ) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.access_requests.get_mut(id) {
            Some(r) if r.status == AccessRequestStatus::Pending => {
                r.status = status;
                r.updated_at = now;
            }
            _ => return Ok(false),
        }
        t.grants.extend(grants.iter().cloned());
        Ok(true)
    }
}

#[async_trait]
impl GenealogyRepo for MemoryStore {
    async fn insert_genealogy(&self, node: &GenealogyNode) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(parent_id) = &node.parent_id
            && !t.genealogy.contains_key(parent_id)
        {
            return Err(StoreError::Referenced(
                "family_genealogy_parent_id_fkey".into(),
            ));
        }
        t.genealogy.insert(node.id.clone(), node.clone());
        Ok(())
    }

    async fn find_genealogy(&self, id: &str) -> StoreResult<Option<GenealogyNode>> {
        Ok(self.tables.read().await.genealogy.get(id).cloned())
    }

    async fn update_genealogy(&self, node: &GenealogyNode) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.genealogy.contains_key(&node.id) {
            t.genealogy.insert(node.id.clone(), node.clone());
        }
        Ok(())
    }

    async fn list_genealogy(&self, family_id: &str) -> StoreResult<Vec<GenealogyNode>> {
        let t = self.tables.read().await;
        let mut rows: Vec<GenealogyNode> = t
            .genealogy
            .values()
            .filter(|n| n.family_id == family_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.generation
                .cmp(&b.generation)
                .then_with(|| a.person_name.cmp(&b.person_name))
        });
        Ok(rows)
    }

    async fn has_children(&self, id: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t.genealogy
            .values()
            .any(|n| n.parent_id.as_deref() == Some(id)))
    }

    async fn delete_genealogy(&self, id: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.genealogy
            .values()
            .any(|n| n.parent_id.as_deref() == Some(id))
        {
            return Err(StoreError::Referenced(
                "family_genealogy_parent_id_fkey".into(),
            ));
        }
        Ok(t.genealogy.remove(id).is_some())
    }
}

#[async_trait]
impl HeritageRepo for MemoryStore {
    async fn insert_story(&self, story: &FamilyStory) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.stories.insert(story.id.clone(), story.clone());
        Ok(())
    }

    async fn find_story(&self, id: &str) -> StoreResult<Option<FamilyStory>> {
        Ok(self.tables.read().await.stories.get(id).cloned())
    }

    async fn update_story(&self, story: &FamilyStory) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(s) = t.stories.get_mut(&story.id) {
            // Counters are owned by the store
            let (views, likes) = (s.view_count, s.like_count);
            *s = story.clone();
            s.view_count = views;
            s.like_count = likes;
        }
        Ok(())
    }

    async fn delete_story(&self, id: &str) -> StoreResult<bool> {
        Ok(self.tables.write().await.stories.remove(id).is_some())
    }

    async fn list_stories(
        &self,
        family_id: &str,
        category: Option<StoryCategory>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyStory>> {
        let t = self.tables.read().await;
        let mut rows: Vec<FamilyStory> = t
            .stories
            .values()
            .filter(|s| s.family_id == family_id && s.is_public)
            .filter(|s| category.is_none_or(|c| s.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(rows, offset, limit))
    }

    async fn increment_story_views(&self, id: &str) -> StoreResult<()> {
        if let Some(s) = self.tables.write().await.stories.get_mut(id) {
            s.view_count += 1;
        }
        Ok(())
    }

    async fn insert_tradition(&self, tradition: &FamilyTradition) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.traditions.insert(tradition.id.clone(), tradition.clone());
        Ok(())
    }

    async fn find_tradition(&self, id: &str) -> StoreResult<Option<FamilyTradition>> {
        Ok(self.tables.read().await.traditions.get(id).cloned())
    }

    async fn update_tradition(&self, tradition: &FamilyTradition) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if let Some(existing) = t.traditions.get_mut(&tradition.id) {
            *existing = tradition.clone();
        }
        Ok(())
    }

    async fn delete_tradition(&self, id: &str) -> StoreResult<bool> {
        Ok(self.tables.write().await.traditions.remove(id).is_some())
    }

    async fn list_traditions(
        &self,
        family_id: &str,
        category: Option<TraditionCategory>,
    ) -> StoreResult<Vec<FamilyTradition>> {
        let t = self.tables.read().await;
        let mut rows: Vec<FamilyTradition> = t
            .traditions
            .values()
            .filter(|tr| tr.family_id == family_id)
            .filter(|tr| category.is_none_or(|c| tr.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[async_trait]
impl ReminderRepo for MemoryStore {
    async fn insert_reminder(&self, reminder: &MemorialReminder) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.reminders.insert(reminder.id.clone(), reminder.clone());
        Ok(())
    }

    async fn find_reminder(&self, id: &str) -> StoreResult<Option<MemorialReminder>> {
        let t = self.tables.read().await;
        Ok(t.reminders.get(id).filter(|r| r.is_active).cloned())
    }

    async fn list_reminders(
        &self,
        family_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StoreResult<Vec<MemorialReminder>> {
        let t = self.tables.read().await;
        let mut rows: Vec<MemorialReminder> = t
            .reminders
            .values()
            .filter(|r| r.family_id == family_id && r.is_active)
            .filter(|r| from.is_none_or(|d| r.reminder_date >= d))
            .filter(|r| to.is_none_or(|d| r.reminder_date <= d))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.reminder_date);
        Ok(rows)
    }

    async fn deactivate_reminder(&self, id: &str, now: i64) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.reminders.get_mut(id).filter(|r| r.is_active) {
            Some(r) => {
                r.is_active = false;
                r.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ActivityRepo for MemoryStore {
    async fn insert_activity(&self, activity: &FamilyActivity) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.activities.insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn find_activity(&self, id: &str) -> StoreResult<Option<FamilyActivity>> {
        Ok(self.tables.read().await.activities.get(id).cloned())
    }

    async fn list_activities(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyActivity>> {
        let t = self.tables.read().await;
        let mut rows: Vec<FamilyActivity> = t
            .activities
            .values()
            .filter(|a| a.family_id == family_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(paginate(rows, offset, limit))
    }

    async fn create_collective_worship(
        &self,
        activity: &FamilyActivity,
        initiator: &CollectiveWorshipParticipant,
    ) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.activities.insert(activity.id.clone(), activity.clone());
        t.participants.push(initiator.clone());
        Ok(())
    }

    async fn add_participant(
        &self,
        participant: &CollectiveWorshipParticipant,
    ) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if t.participants.iter().any(|p| {
            p.activity_id == participant.activity_id && p.user_id == participant.user_id
        }) {
            return Ok(false);
        }
        t.participants.push(participant.clone());
        Ok(true)
    }

    async fn list_participants(
        &self,
        activity_id: &str,
    ) -> StoreResult<Vec<CollectiveWorshipParticipant>> {
        let t = self.tables.read().await;
        let mut rows: Vec<CollectiveWorshipParticipant> = t
            .participants
            .iter()
            .filter(|p| p.activity_id == activity_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.joined_at);
        Ok(rows)
    }

    async fn update_activity_content(&self, id: &str, content: &Value) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        match t.activities.get_mut(id) {
            Some(a) => {
                a.content = content.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Gender, UserStatus};

    fn family(id: &str, code: &str) -> Family {
        Family {
            id: id.into(),
            name: "Li".into(),
            description: None,
            creator_id: "creator".into(),
            invite_code: code.into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn member(family_id: &str, user_id: &str, role: FamilyRole) -> FamilyMember {
        FamilyMember {
            id: format!("{family_id}-{user_id}"),
            family_id: family_id.into(),
            user_id: user_id.into(),
            role,
            joined_at: 0,
        }
    }

    fn node(id: &str, parent: Option<&str>) -> GenealogyNode {
        GenealogyNode {
            id: id.into(),
            family_id: "f1".into(),
            person_name: id.into(),
            generation: 1,
            parent_id: parent.map(Into::into),
            gender: Gender::Male,
            birth_date: None,
            death_date: None,
            biography: None,
            avatar_url: None,
            memorial_id: None,
            position: None,
            achievements: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn duplicate_invite_code_is_rejected() {
        let store = MemoryStore::new();
        store
            .create_family(&family("f1", "AAAA1111"), &member("f1", "creator", FamilyRole::Admin))
            .await
            .unwrap();
        let err = store
            .create_family(&family("f2", "AAAA1111"), &member("f2", "creator", FamilyRole::Admin))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(store.find_family("f2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creator_row_survives_delete_member() {
        let store = MemoryStore::new();
        store
            .create_family(&family("f1", "AAAA1111"), &member("f1", "creator", FamilyRole::Admin))
            .await
            .unwrap();
        assert!(!store.delete_member("f1", "creator").await.unwrap());
        assert!(store.find_member("f1", "creator").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn genealogy_parent_with_children_cannot_be_deleted() {
        let store = MemoryStore::new();
        store.insert_genealogy(&node("root", None)).await.unwrap();
        store
            .insert_genealogy(&node("child", Some("root")))
            .await
            .unwrap();
        assert!(matches!(
            store.delete_genealogy("root").await,
            Err(StoreError::Referenced(_))
        ));
        assert!(store.delete_genealogy("child").await.unwrap());
        assert!(store.delete_genealogy("root").await.unwrap());
    }

    #[tokio::test]
    async fn participant_insert_is_idempotent() {
        let store = MemoryStore::new();
        let p = CollectiveWorshipParticipant {
            activity_id: "a1".into(),
            user_id: "u1".into(),
            joined_at: 1,
        };
        assert!(store.add_participant(&p).await.unwrap());
        assert!(!store.add_participant(&p).await.unwrap());
        assert_eq!(store.list_participants("a1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn users_round_trip() {
        let store = MemoryStore::new();
        let user = User {
            id: "u1".into(),
            nickname: "Ming".into(),
            avatar_url: None,
            status: UserStatus::Enabled,
            created_at: 0,
        };
        store.insert_user(&user).await.unwrap();
        assert!(store.insert_user(&user).await.unwrap_err().is_duplicate());
        assert_eq!(store.find_user("u1").await.unwrap().unwrap().nickname, "Ming");
    }

    #[tokio::test]
    async fn privacy_rows_must_reference_existing_users_and_families() {
        let store = MemoryStore::new();
        let grant = VisitorPermission {
            id: "g1".into(),
            memorial_id: "m1".into(),
            family_id: Some("ghost-family".into()),
            user_id: None,
            permission_type: PermissionType::View,
            is_allowed: true,
            created_at: 0,
        };
        assert!(matches!(
            store
                .replace_privacy("m1", PrivacyLevel::Private, &[grant], &[], 0)
                .await,
            Err(StoreError::Referenced(_))
        ));

        let entry = BlacklistEntry {
            id: "b1".into(),
            memorial_id: "m1".into(),
            user_id: "ghost".into(),
            reason: None,
            created_at: 0,
        };
        assert!(matches!(
            store.add_to_blacklist(&entry).await,
            Err(StoreError::Referenced(_))
        ));
        assert!(store.list_grants("m1").await.unwrap().is_empty());
        assert!(store.list_blacklist("m1").await.unwrap().is_empty());
    }
}
