//! Privacy Controller
//!
//! Mutation side of memorial privacy: privacy level, visitor grants,
//! blacklist and access requests. Decisions live in [`AccessEvaluator`].

use std::collections::HashSet;
use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AccessRequest, AccessRequestStatus, BlacklistEntry, PermissionType, PrivacyLevel,
    PrivacySettings, PrivacySettingsRequest, VisitorPermission,
};
use shared::request::{PaginatedResponse, PaginationQuery};
use shared::util::{new_id, now_millis};
use shared::validation::{MAX_LIST_LEN, MAX_NOTE_LEN, validate_list_len, validate_optional_text};

use super::access::AccessEvaluator;
use crate::db::Store;
use crate::error::ServiceResult;

const SETTINGS_BLACKLIST_REASON: &str = "privacy settings";

#[derive(Clone)]
pub struct PrivacyController {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
}

/// Parse and de-duplicate permission names
fn parse_permissions(names: &[String]) -> Result<Vec<PermissionType>, AppError> {
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let permission = PermissionType::from_db(name).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidPermissionType,
                format!("Unknown permission type: {name}"),
            )
        })?;
        if !out.contains(&permission) {
            out.push(permission);
        }
    }
    Ok(out)
}

fn dedup(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(String::as_str)
        .filter(|id| seen.insert(*id))
        .collect()
}

impl PrivacyController {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator) -> Self {
        Self { store, access }
    }

    async fn ensure_users_exist(&self, user_ids: &[&str]) -> ServiceResult<()> {
        for user_id in user_ids {
            if self.store.find_user(user_id).await?.is_none() {
                return Err(AppError::with_message(
                    ErrorCode::UserNotFound,
                    format!("User not found: {user_id}"),
                )
                .into());
            }
        }
        Ok(())
    }

    async fn ensure_families_exist(&self, family_ids: &[&str]) -> ServiceResult<()> {
        for family_id in family_ids {
            if self.store.find_family(family_id).await?.is_none() {
                return Err(AppError::with_message(
                    ErrorCode::FamilyNotFound,
                    format!("Family not found: {family_id}"),
                )
                .into());
            }
        }
        Ok(())
    }

    /// Replace the privacy level, every grant and the whole blacklist
    pub async fn set_memorial_privacy(
        &self,
        owner: &str,
        req: PrivacySettingsRequest,
    ) -> ServiceResult<PrivacySettings> {
        let memorial = self.access.ensure_memorial_modify(owner, &req.memorial_id).await?;

        let level = PrivacyLevel::try_from(req.privacy_level)
            .map_err(|msg| AppError::with_message(ErrorCode::InvalidPrivacyLevel, msg))?;
        let permissions = parse_permissions(&req.visitor_permissions)?;
        validate_list_len(&req.allowed_family_ids, "allowed_family_ids", MAX_LIST_LEN)?;
        validate_list_len(&req.allowed_user_ids, "allowed_user_ids", MAX_LIST_LEN)?;
        validate_list_len(&req.blocked_user_ids, "blocked_user_ids", MAX_LIST_LEN)?;

        let blocked = dedup(&req.blocked_user_ids);
        if blocked.contains(&owner) {
            return Err(ErrorCode::CannotBlacklistOwner.into());
        }
        let families = dedup(&req.allowed_family_ids);
        let users = dedup(&req.allowed_user_ids);
        self.ensure_families_exist(&families).await?;
        self.ensure_users_exist(&users).await?;
        self.ensure_users_exist(&blocked).await?;

        let now = now_millis();
        let mut grants = Vec::new();
        for family_id in families {
            for permission in &permissions {
                grants.push(VisitorPermission {
                    id: new_id(),
                    memorial_id: memorial.id.clone(),
                    family_id: Some(family_id.to_string()),
                    user_id: None,
                    permission_type: *permission,
                    is_allowed: true,
                    created_at: now,
                });
            }
        }
        // Blocked users never receive user-scoped grants from the same request
        for user_id in users {
            if blocked.contains(&user_id) {
                continue;
            }
            for permission in &permissions {
                grants.push(VisitorPermission {
                    id: new_id(),
                    memorial_id: memorial.id.clone(),
                    family_id: None,
                    user_id: Some(user_id.to_string()),
                    permission_type: *permission,
                    is_allowed: true,
                    created_at: now,
                });
            }
        }
        let blacklist: Vec<BlacklistEntry> = blocked
            .iter()
            .map(|user_id| BlacklistEntry {
                id: new_id(),
                memorial_id: memorial.id.clone(),
                user_id: user_id.to_string(),
                reason: Some(SETTINGS_BLACKLIST_REASON.to_string()),
                created_at: now,
            })
            .collect();

        self.store
            .replace_privacy(&memorial.id, level, &grants, &blacklist, now)
            .await?;
        tracing::info!(
            memorial_id = %memorial.id,
            privacy_level = ?level,
            grants = grants.len(),
            blacklisted = blacklist.len(),
            "Memorial privacy replaced"
        );

        self.get_privacy_settings(owner, &memorial.id).await
    }

    /// Creator only
    pub async fn get_privacy_settings(
        &self,
        owner: &str,
        memorial_id: &str,
    ) -> ServiceResult<PrivacySettings> {
        let memorial = self.access.ensure_memorial_modify(owner, memorial_id).await?;
        let permissions = self.store.list_grants(memorial_id).await?;
        let blacklist = self.store.list_blacklist(memorial_id).await?;
        let (access_requests, _) = self
            .store
            .list_access_requests(memorial_id, Some(AccessRequestStatus::Pending), 0, i64::MAX)
            .await?;

        Ok(PrivacySettings {
            privacy_level: memorial.privacy_level,
            memorial,
            permissions,
            blacklist,
            access_requests,
        })
    }

    /// Whether the actor holds `permission` on the memorial
    pub async fn check_user_access(
        &self,
        actor: &str,
        memorial_id: &str,
        permission: PermissionType,
    ) -> ServiceResult<bool> {
        let memorial = self.access.load_memorial(memorial_id).await?;
        let access = self.access.evaluate(actor, &memorial, permission).await?;
        Ok(access.allowed)
    }

    pub async fn request_access(
        &self,
        actor: &str,
        memorial_id: &str,
        message: Option<String>,
    ) -> ServiceResult<AccessRequest> {
        let memorial = self.access.load_memorial(memorial_id).await?;
        if memorial.creator_id == actor {
            return Err(ErrorCode::OwnerCannotRequestAccess.into());
        }
        if self.store.is_blacklisted(memorial_id, actor).await? {
            return Err(ErrorCode::UserBlacklisted.into());
        }
        validate_optional_text(&message, "message", MAX_NOTE_LEN)?;

        let now = now_millis();
        let request = AccessRequest {
            id: new_id(),
            memorial_id: memorial.id,
            user_id: actor.to_string(),
            message,
            status: AccessRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_access_request(&request).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => return Err(ErrorCode::AccessRequestPending.into()),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(memorial_id, user_id = actor, "Access requested");
        Ok(request)
    }

    /// Creator only. Approval grants one user-scoped permission per entry.
    pub async fn handle_access_request(
        &self,
        owner: &str,
        request_id: &str,
        approve: bool,
        permissions: &[String],
    ) -> ServiceResult<AccessRequest> {
        let mut request = self
            .store
            .find_access_request(request_id)
            .await?
            .ok_or(ErrorCode::AccessRequestNotFound)?;
        self.access
            .ensure_memorial_modify(owner, &request.memorial_id)
            .await?;
        if request.status != AccessRequestStatus::Pending {
            return Err(ErrorCode::AccessRequestHandled.into());
        }

        let now = now_millis();
        let (status, grants) = if approve {
            let grants = parse_permissions(permissions)?
                .into_iter()
                .map(|permission| VisitorPermission {
                    id: new_id(),
                    memorial_id: request.memorial_id.clone(),
                    family_id: None,
                    user_id: Some(request.user_id.clone()),
                    permission_type: permission,
                    is_allowed: true,
                    created_at: now,
                })
                .collect();
            (AccessRequestStatus::Approved, grants)
        } else {
            (AccessRequestStatus::Rejected, Vec::new())
        };

        if !self
            .store
            .resolve_access_request(request_id, status, &grants, now)
            .await?
        {
            return Err(ErrorCode::AccessRequestHandled.into());
        }
        tracing::info!(
            request_id,
            memorial_id = %request.memorial_id,
            status = ?status,
            "Access request resolved"
        );

        request.status = status;
        request.updated_at = now;
        Ok(request)
    }

    /// Creator only; optional status filter
    pub async fn list_access_requests(
        &self,
        owner: &str,
        memorial_id: &str,
        status: Option<AccessRequestStatus>,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<AccessRequest>> {
        self.access.ensure_memorial_modify(owner, memorial_id).await?;
        let (rows, total) = self
            .store
            .list_access_requests(memorial_id, status, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    /// Creator only; drops the user's user-scoped grants on the memorial
    pub async fn add_to_blacklist(
        &self,
        owner: &str,
        memorial_id: &str,
        user_id: &str,
        reason: Option<String>,
    ) -> ServiceResult<BlacklistEntry> {
        let memorial = self.access.ensure_memorial_modify(owner, memorial_id).await?;
        if memorial.creator_id == user_id {
            return Err(ErrorCode::CannotBlacklistOwner.into());
        }
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;
        self.ensure_users_exist(&[user_id]).await?;

        let entry = BlacklistEntry {
            id: new_id(),
            memorial_id: memorial.id,
            user_id: user_id.to_string(),
            reason,
            created_at: now_millis(),
        };
        match self.store.add_to_blacklist(&entry).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => return Err(ErrorCode::AlreadyBlacklisted.into()),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(memorial_id, user_id, "User blacklisted");
        Ok(entry)
    }

    /// Creator only; removing an absent entry is not an error
    pub async fn remove_from_blacklist(
        &self,
        owner: &str,
        memorial_id: &str,
        user_id: &str,
    ) -> ServiceResult<()> {
        self.access.ensure_memorial_modify(owner, memorial_id).await?;
        if self.store.remove_from_blacklist(memorial_id, user_id).await? {
            tracing::info!(memorial_id, user_id, "User removed from blacklist");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_are_parsed_and_deduplicated() {
        let names = vec!["view".to_string(), "worship".to_string(), "view".to_string()];
        let parsed = parse_permissions(&names).unwrap();
        assert_eq!(parsed, vec![PermissionType::View, PermissionType::Worship]);
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let err = parse_permissions(&["edit".to_string()]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPermissionType);
    }

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup(&ids), vec!["b", "a"]);
    }
}
