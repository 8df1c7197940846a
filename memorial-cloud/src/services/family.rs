//! Family Graph Manager: family lifecycle, membership, invitations and
//! memorial links

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, Family, FamilyCreate, FamilyDetail, FamilyInvitation, FamilyMember, FamilyRole,
    FamilyUpdate, INVITATION_TTL_MS, InvitationStatus, InviteMembersRequest, Memorial,
    MemorialFamily,
};
use shared::request::{PaginatedResponse, PaginationQuery};
use shared::util::{invite_code, new_id, normalize_invite_code, now_millis};
use shared::validation::{
    MAX_LIST_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_TEXT_LEN, non_blank, validate_list_len,
    validate_optional_text, validate_required_text,
};

use super::access::AccessEvaluator;
use super::activity::ActivityLedger;
use crate::db::{InvitationOutcome, Store, StoreError};
use crate::error::ServiceResult;

/// Attempts at finding an unused invite code before giving up
const INVITE_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct FamilyGraph {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
    ledger: ActivityLedger,
}

impl FamilyGraph {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator, ledger: ActivityLedger) -> Self {
        Self {
            store,
            access,
            ledger,
        }
    }

    // ── Family lifecycle ────────────────────────────────────────────

    pub async fn create_family(&self, actor: &str, req: FamilyCreate) -> ServiceResult<Family> {
        validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&req.description, "description", MAX_TEXT_LEN)?;

        let now = now_millis();
        let family_id = new_id();
        let creator = FamilyMember {
            id: new_id(),
            family_id: family_id.clone(),
            user_id: actor.to_string(),
            role: FamilyRole::Admin,
            joined_at: now,
        };

        for attempt in 1..=INVITE_CODE_ATTEMPTS {
            let family = Family {
                id: family_id.clone(),
                name: req.name.trim().to_string(),
                description: req.description.clone(),
                creator_id: actor.to_string(),
                invite_code: invite_code(),
                created_at: now,
                updated_at: now,
            };
            match self.store.create_family(&family, &creator).await {
                Ok(()) => {
                    tracing::info!(family_id = %family.id, creator = actor, "Family created");
                    return Ok(family);
                }
                Err(StoreError::Duplicate(constraint)) => {
                    tracing::warn!(attempt, constraint = %constraint, "Invite code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ErrorCode::InviteCodeExhausted.into())
    }

    pub async fn list_families(
        &self,
        actor: &str,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<Family>> {
        let (rows, total) = self
            .store
            .list_user_families(actor, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    pub async fn get_family(&self, actor: &str, family_id: &str) -> ServiceResult<FamilyDetail> {
        let (family, my_role) = self.access.require_family_member(actor, family_id).await?;
        let (members, _) = self.store.list_members(family_id, 0, i64::MAX).await?;
        Ok(FamilyDetail {
            family,
            members,
            my_role,
        })
    }

    pub async fn update_family(
        &self,
        actor: &str,
        family_id: &str,
        req: FamilyUpdate,
    ) -> ServiceResult<Family> {
        let mut family = self.access.require_family_admin(actor, family_id).await?;
        if let Some(name) = &req.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            family.name = name.trim().to_string();
        }
        validate_optional_text(&req.description, "description", MAX_TEXT_LEN)?;
        if req.description.is_some() {
            family.description = non_blank(&req.description).map(str::to_string);
        }
        family.updated_at = now_millis();

        self.store.update_family(&family).await?;
        Ok(family)
    }

    /// Creator only; removes the family and everything scoped to it
    pub async fn delete_family(&self, actor: &str, family_id: &str) -> ServiceResult<()> {
        self.access.require_family_creator(actor, family_id).await?;
        self.store.delete_family(family_id).await?;
        tracing::info!(family_id, actor, "Family deleted");
        Ok(())
    }

    // ── Invitations ─────────────────────────────────────────────────

    /// Admin only. Existing members and users with an open invitation are
    /// skipped silently; the rest are invited in one batch.
    pub async fn invite_members(
        &self,
        actor: &str,
        family_id: &str,
        req: InviteMembersRequest,
    ) -> ServiceResult<Vec<FamilyInvitation>> {
        self.access.require_family_admin(actor, family_id).await?;
        validate_list_len(&req.user_ids, "user_ids", MAX_LIST_LEN)?;
        validate_optional_text(&req.message, "message", MAX_NOTE_LEN)?;

        let now = now_millis();
        let mut seen = HashSet::new();
        let mut invitations = Vec::new();
        for invitee in &req.user_ids {
            if !seen.insert(invitee.as_str()) {
                continue;
            }
            if self.store.find_user(invitee).await?.is_none() {
                return Err(AppError::with_message(
                    ErrorCode::UserNotFound,
                    format!("User {invitee} not found"),
                )
                .into());
            }
            if self.store.find_member(family_id, invitee).await?.is_some()
                || self.store.has_open_invitation(family_id, invitee).await?
            {
                continue;
            }
            invitations.push(FamilyInvitation {
                id: new_id(),
                family_id: family_id.to_string(),
                inviter_id: actor.to_string(),
                invitee_id: invitee.clone(),
                message: req.message.clone(),
                status: InvitationStatus::Pending,
                expires_at: now + INVITATION_TTL_MS,
                created_at: now,
                updated_at: now,
            });
        }

        if !invitations.is_empty() {
            self.store.insert_invitations(&invitations).await?;
            tracing::info!(family_id, count = invitations.len(), "Family invitations sent");
        }
        Ok(invitations)
    }

    /// Pending, unexpired invitations addressed to the actor
    pub async fn list_my_invitations(&self, actor: &str) -> ServiceResult<Vec<FamilyInvitation>> {
        Ok(self
            .store
            .list_pending_invitations(actor, now_millis())
            .await?)
    }

    pub async fn respond_to_invitation(
        &self,
        actor: &str,
        invitation_id: &str,
        accept: bool,
    ) -> ServiceResult<FamilyInvitation> {
        let mut invitation = self
            .store
            .find_invitation(invitation_id)
            .await?
            .filter(|inv| inv.invitee_id == actor)
            .ok_or(ErrorCode::InvitationNotFound)?;

        if invitation.status != InvitationStatus::Pending {
            return Err(ErrorCode::InvitationHandled.into());
        }
        let now = now_millis();
        if invitation.is_expired(now) {
            return Err(ErrorCode::InvitationExpired.into());
        }

        let status = if accept {
            InvitationStatus::Accepted
        } else {
            InvitationStatus::Declined
        };
        let member = accept.then(|| FamilyMember {
            id: new_id(),
            family_id: invitation.family_id.clone(),
            user_id: actor.to_string(),
            role: FamilyRole::Member,
            joined_at: now,
        });

        match self
            .store
            .respond_invitation(invitation_id, status, member.as_ref(), now)
            .await?
        {
            InvitationOutcome::NotPending => return Err(ErrorCode::InvitationHandled.into()),
            InvitationOutcome::Responded { joined: true } => {
                self.ledger
                    .record(
                        &invitation.family_id,
                        actor,
                        None,
                        ActivityType::Join,
                        json!({ "method": "invitation", "invitation_id": invitation.id }),
                    )
                    .await;
            }
            InvitationOutcome::Responded { joined: false } => {}
        }

        invitation.status = status;
        invitation.updated_at = now;
        Ok(invitation)
    }

    // ── Membership ──────────────────────────────────────────────────

    pub async fn join_family_by_code(&self, actor: &str, code: &str) -> ServiceResult<Family> {
        let code = normalize_invite_code(code);
        let family = self
            .store
            .find_family_by_code(&code)
            .await?
            .ok_or(ErrorCode::InvalidInviteCode)?;

        if self.store.find_member(&family.id, actor).await?.is_some() {
            return Err(ErrorCode::AlreadyFamilyMember.into());
        }
        let member = FamilyMember {
            id: new_id(),
            family_id: family.id.clone(),
            user_id: actor.to_string(),
            role: FamilyRole::Member,
            joined_at: now_millis(),
        };
        match self.store.insert_member(&member).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => return Err(ErrorCode::AlreadyFamilyMember.into()),
            Err(e) => return Err(e.into()),
        }

        self.ledger
            .record(
                &family.id,
                actor,
                None,
                ActivityType::Join,
                json!({ "method": "invite_code" }),
            )
            .await;
        Ok(family)
    }

    pub async fn remove_member(
        &self,
        actor: &str,
        family_id: &str,
        member_id: &str,
    ) -> ServiceResult<()> {
        let family = self.access.require_family_admin(actor, family_id).await?;
        if family.creator_id == member_id {
            return Err(ErrorCode::CannotRemoveCreator.into());
        }
        if !self.store.delete_member(family_id, member_id).await? {
            return Err(ErrorCode::FamilyMemberNotFound.into());
        }

        self.ledger
            .record(
                family_id,
                actor,
                None,
                ActivityType::RemoveMember,
                json!({ "member_id": member_id }),
            )
            .await;
        Ok(())
    }

    pub async fn leave_family(&self, actor: &str, family_id: &str) -> ServiceResult<()> {
        let family = self.access.load_family(family_id).await?;
        if family.creator_id == actor {
            return Err(ErrorCode::CreatorCannotLeave.into());
        }
        if !self.store.delete_member(family_id, actor).await? {
            return Err(ErrorCode::NotFamilyMember.into());
        }

        self.ledger
            .record(family_id, actor, None, ActivityType::Leave, json!({}))
            .await;
        Ok(())
    }

    /// Creator only; the creator's own role is fixed
    pub async fn set_member_role(
        &self,
        actor: &str,
        family_id: &str,
        member_id: &str,
        role: &str,
    ) -> ServiceResult<FamilyMember> {
        let family = self.access.require_family_creator(actor, family_id).await?;
        if family.creator_id == member_id {
            return Err(ErrorCode::CannotChangeCreatorRole.into());
        }
        let role = FamilyRole::from_db(role).ok_or_else(|| {
            AppError::with_message(ErrorCode::InvalidFamilyRole, format!("Unknown role: {role}"))
        })?;

        if !self
            .store
            .update_member_role(family_id, member_id, role)
            .await?
        {
            return Err(ErrorCode::FamilyMemberNotFound.into());
        }
        let member = self
            .store
            .find_member(family_id, member_id)
            .await?
            .ok_or(ErrorCode::FamilyMemberNotFound)?;

        self.ledger
            .record(
                family_id,
                actor,
                None,
                ActivityType::SetRole,
                json!({ "member_id": member_id, "role": role }),
            )
            .await;
        Ok(member)
    }

    /// Admins first, then by join time
    pub async fn list_members(
        &self,
        actor: &str,
        family_id: &str,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<FamilyMember>> {
        self.access.require_family_member(actor, family_id).await?;
        let (rows, total) = self
            .store
            .list_members(family_id, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    // ── Memorial links ──────────────────────────────────────────────

    /// Requires family admin and memorial creator
    pub async fn add_memorial_to_family(
        &self,
        actor: &str,
        family_id: &str,
        memorial_id: &str,
    ) -> ServiceResult<MemorialFamily> {
        self.access.require_family_admin(actor, family_id).await?;
        let memorial = self.access.ensure_memorial_modify(actor, memorial_id).await?;

        let link = MemorialFamily {
            id: new_id(),
            memorial_id: memorial.id.clone(),
            family_id: family_id.to_string(),
            created_at: now_millis(),
        };
        match self.store.link_memorial(&link).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => return Err(ErrorCode::MemorialAlreadyLinked.into()),
            Err(e) => return Err(e.into()),
        }

        self.ledger
            .record(
                family_id,
                actor,
                Some(&memorial.id),
                ActivityType::AddMemorial,
                json!({ "deceased_name": memorial.deceased_name }),
            )
            .await;
        Ok(link)
    }

    pub async fn remove_memorial_from_family(
        &self,
        actor: &str,
        family_id: &str,
        memorial_id: &str,
    ) -> ServiceResult<()> {
        self.access.require_family_admin(actor, family_id).await?;
        if !self.store.unlink_memorial(family_id, memorial_id).await? {
            return Err(ErrorCode::MemorialNotLinked.into());
        }

        self.ledger
            .record(
                family_id,
                actor,
                Some(memorial_id),
                ActivityType::RemoveMemorial,
                json!({}),
            )
            .await;
        Ok(())
    }

    pub async fn list_family_memorials(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<Vec<Memorial>> {
        self.access.require_family_member(actor, family_id).await?;
        Ok(self.store.list_family_memorials(family_id).await?)
    }
}
