//! Access Evaluator
//!
//! Read-side authorization decisions for memorials and families. Every
//! feature service calls in here before touching a memorial or family.
//!
//! Memorial decision order: existence, ownership, blacklist, privacy level.
//! Ownership is checked first, so the creator is never locked out by their
//! own blacklist.

use std::sync::Arc;

use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{
    Family, FamilyRole, Memorial, MemorialAccess, PermissionType, PrivacyLevel,
};
use shared::request::{PaginatedResponse, PaginationQuery};

use crate::db::Store;
use crate::error::ServiceResult;

/// Result of a family access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FamilyAccess {
    pub allowed: bool,
    pub role: Option<FamilyRole>,
}

#[derive(Clone)]
pub struct AccessEvaluator {
    store: Arc<dyn Store>,
}

impl AccessEvaluator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Active memorial or `MemorialNotFound`
    pub async fn load_memorial(&self, memorial_id: &str) -> ServiceResult<Memorial> {
        self.store
            .find_active_memorial(memorial_id)
            .await?
            .ok_or_else(|| ErrorCode::MemorialNotFound.into())
    }

    pub async fn can_access_memorial(
        &self,
        actor: &str,
        memorial_id: &str,
    ) -> ServiceResult<MemorialAccess> {
        let memorial = self.load_memorial(memorial_id).await?;
        self.evaluate(actor, &memorial, PermissionType::View).await
    }

    /// Creator only, regardless of privacy level or grants
    pub async fn can_modify_memorial(&self, actor: &str, memorial_id: &str) -> ServiceResult<bool> {
        let memorial = self.load_memorial(memorial_id).await?;
        Ok(memorial.creator_id == actor)
    }

    /// Decision for one capability on an already loaded memorial
    pub async fn evaluate(
        &self,
        actor: &str,
        memorial: &Memorial,
        permission: PermissionType,
    ) -> ServiceResult<MemorialAccess> {
        if memorial.creator_id == actor {
            return Ok(MemorialAccess::OWNER);
        }
        if self.store.is_blacklisted(&memorial.id, actor).await? {
            return Ok(MemorialAccess::DENIED);
        }

        match memorial.privacy_level {
            PrivacyLevel::Public => Ok(MemorialAccess::GRANTED),
            PrivacyLevel::Family => {
                let families = self
                    .store
                    .member_family_ids_for_memorial(&memorial.id, actor)
                    .await?;
                if !families.is_empty() {
                    return Ok(MemorialAccess::FAMILY);
                }
                if self.store.has_user_grant(&memorial.id, actor, permission).await?
                    || self
                        .store
                        .has_family_grant(&memorial.id, actor, permission)
                        .await?
                {
                    return Ok(MemorialAccess::GRANTED);
                }
                Ok(MemorialAccess::DENIED)
            }
            // Family-scoped grants are not evaluated for private memorials
            PrivacyLevel::Private => {
                if self.store.has_user_grant(&memorial.id, actor, permission).await? {
                    Ok(MemorialAccess::GRANTED)
                } else {
                    Ok(MemorialAccess::DENIED)
                }
            }
        }
    }

    /// Load the memorial and require view access
    pub async fn ensure_memorial_access(
        &self,
        actor: &str,
        memorial_id: &str,
    ) -> ServiceResult<(Memorial, MemorialAccess)> {
        let memorial = self.load_memorial(memorial_id).await?;
        let access = self.evaluate(actor, &memorial, PermissionType::View).await?;
        if !access.allowed {
            return Err(ErrorCode::MemorialAccessDenied.into());
        }
        Ok((memorial, access))
    }

    /// Load the memorial and require ownership.
    ///
    /// Actors who cannot even see the memorial get `MemorialAccessDenied`;
    /// visitors who can see it get `MemorialOwnerRequired`.
    pub async fn ensure_memorial_modify(
        &self,
        actor: &str,
        memorial_id: &str,
    ) -> ServiceResult<Memorial> {
        let memorial = self.load_memorial(memorial_id).await?;
        if memorial.creator_id == actor {
            return Ok(memorial);
        }
        let access = self.evaluate(actor, &memorial, PermissionType::View).await?;
        if access.allowed {
            Err(ErrorCode::MemorialOwnerRequired.into())
        } else {
            Err(ErrorCode::MemorialAccessDenied.into())
        }
    }

    /// Family or `FamilyNotFound`
    pub async fn load_family(&self, family_id: &str) -> ServiceResult<Family> {
        self.store
            .find_family(family_id)
            .await?
            .ok_or_else(|| ErrorCode::FamilyNotFound.into())
    }

    /// Role from the member row; the creator counts as admin even without one
    async fn effective_role(&self, actor: &str, family: &Family) -> ServiceResult<Option<FamilyRole>> {
        if family.creator_id == actor {
            return Ok(Some(FamilyRole::Admin));
        }
        Ok(self
            .store
            .find_member(&family.id, actor)
            .await?
            .map(|m| m.role))
    }

    pub async fn can_access_family(&self, actor: &str, family_id: &str) -> ServiceResult<FamilyAccess> {
        let family = self.load_family(family_id).await?;
        let role = self.effective_role(actor, &family).await?;
        Ok(FamilyAccess {
            allowed: role.is_some(),
            role,
        })
    }

    pub async fn can_manage_family(&self, actor: &str, family_id: &str) -> ServiceResult<bool> {
        let access = self.can_access_family(actor, family_id).await?;
        Ok(access.role.is_some_and(|r| r.is_admin()))
    }

    pub async fn require_family_member(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<(Family, FamilyRole)> {
        let family = self.load_family(family_id).await?;
        match self.effective_role(actor, &family).await? {
            Some(role) => Ok((family, role)),
            None => Err(ErrorCode::NotFamilyMember.into()),
        }
    }

    pub async fn require_family_admin(&self, actor: &str, family_id: &str) -> ServiceResult<Family> {
        let (family, role) = self.require_family_member(actor, family_id).await?;
        if !role.is_admin() {
            return Err(ErrorCode::FamilyAdminRequired.into());
        }
        Ok(family)
    }

    pub async fn require_family_creator(
        &self,
        actor: &str,
        family_id: &str,
    ) -> ServiceResult<Family> {
        let family = self.load_family(family_id).await?;
        if family.creator_id != actor {
            return Err(ErrorCode::FamilyCreatorRequired.into());
        }
        Ok(family)
    }

    /// Memorials the actor created or that are linked to one of the actor's families
    pub async fn list_accessible_memorials(
        &self,
        actor: &str,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<Memorial>> {
        let (rows, total) = self
            .store
            .list_accessible_memorials(actor, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }
}
