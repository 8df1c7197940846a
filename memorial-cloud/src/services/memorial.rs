//! Memorial CRUD, worship records and visitor records
//!
//! Consumer of the Access Evaluator and the worship sync hook.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Memorial, MemorialCreate, MemorialStatus, MemorialUpdate, PermissionType, PrivacyLevel,
    VisitorRecord, WorshipCreate, WorshipRecord, WorshipType,
};
use shared::request::{PaginatedResponse, PaginationQuery};
use shared::util::{DAY_MS, day_start_millis, new_id, now_millis};
use shared::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_TEXT_LEN, MAX_URL_LEN, non_blank, validate_optional_text,
    validate_required_text,
};

use super::access::AccessEvaluator;
use super::activity::ActivityLedger;
use crate::db::Store;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct MemorialService {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
    ledger: ActivityLedger,
}

impl MemorialService {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator, ledger: ActivityLedger) -> Self {
        Self {
            store,
            access,
            ledger,
        }
    }

    pub async fn create_memorial(&self, actor: &str, req: MemorialCreate) -> ServiceResult<Memorial> {
        validate_required_text(&req.deceased_name, "deceased_name", MAX_NAME_LEN)?;
        validate_optional_text(&req.biography, "biography", MAX_TEXT_LEN)?;
        validate_optional_text(&req.epitaph, "epitaph", MAX_NOTE_LEN)?;
        validate_optional_text(&req.avatar_url, "avatar_url", MAX_URL_LEN)?;
        let privacy_level = match req.privacy_level {
            Some(level) => PrivacyLevel::try_from(level)
                .map_err(|msg| AppError::with_message(ErrorCode::InvalidPrivacyLevel, msg))?,
            None => PrivacyLevel::Family,
        };

        let now = now_millis();
        let memorial = Memorial {
            id: new_id(),
            creator_id: actor.to_string(),
            deceased_name: req.deceased_name.trim().to_string(),
            biography: req.biography,
            avatar_url: req.avatar_url,
            epitaph: req.epitaph,
            birth_date: req.birth_date,
            death_date: req.death_date,
            privacy_level,
            status: MemorialStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_memorial(&memorial).await?;

        tracing::info!(memorial_id = %memorial.id, creator = actor, "Memorial created");
        Ok(memorial)
    }

    /// View access required. Non-owner reads are recorded as one visit per UTC day.
    pub async fn get_memorial(
        &self,
        actor: &str,
        memorial_id: &str,
        ip_address: Option<String>,
    ) -> ServiceResult<Memorial> {
        let (memorial, _) = self.access.ensure_memorial_access(actor, memorial_id).await?;

        if memorial.creator_id != actor {
            let now = now_millis();
            let visit = VisitorRecord {
                id: new_id(),
                memorial_id: memorial.id.clone(),
                visitor_id: actor.to_string(),
                ip_address,
                visited_at: now,
            };
            if let Err(e) = self.store.record_visit(&visit, day_start_millis(now)).await {
                tracing::warn!(memorial_id, visitor = actor, error = %e, "Failed to record visit");
            }
        }
        Ok(memorial)
    }

    pub async fn update_memorial(
        &self,
        actor: &str,
        memorial_id: &str,
        req: MemorialUpdate,
    ) -> ServiceResult<Memorial> {
        let mut memorial = self.access.ensure_memorial_modify(actor, memorial_id).await?;

        if let Some(name) = &req.deceased_name {
            validate_required_text(name, "deceased_name", MAX_NAME_LEN)?;
            memorial.deceased_name = name.trim().to_string();
        }
        validate_optional_text(&req.biography, "biography", MAX_TEXT_LEN)?;
        validate_optional_text(&req.epitaph, "epitaph", MAX_NOTE_LEN)?;
        validate_optional_text(&req.avatar_url, "avatar_url", MAX_URL_LEN)?;
        if req.biography.is_some() {
            memorial.biography = non_blank(&req.biography).map(str::to_string);
        }
        if req.epitaph.is_some() {
            memorial.epitaph = non_blank(&req.epitaph).map(str::to_string);
        }
        if req.avatar_url.is_some() {
            memorial.avatar_url = non_blank(&req.avatar_url).map(str::to_string);
        }
        if req.birth_date.is_some() {
            memorial.birth_date = req.birth_date;
        }
        if req.death_date.is_some() {
            memorial.death_date = req.death_date;
        }
        memorial.updated_at = now_millis();

        self.store.update_memorial(&memorial).await?;
        Ok(memorial)
    }

    /// Creator only; soft delete
    pub async fn delete_memorial(&self, actor: &str, memorial_id: &str) -> ServiceResult<()> {
        let memorial = self.access.ensure_memorial_modify(actor, memorial_id).await?;
        if !self
            .store
            .soft_delete_memorial(&memorial.id, now_millis())
            .await?
        {
            return Err(ErrorCode::MemorialNotFound.into());
        }
        tracing::info!(memorial_id, actor, "Memorial deleted");
        Ok(())
    }

    /// Requires the `worship` capability; mirrored into the actor's families
    pub async fn worship(
        &self,
        actor: &str,
        memorial_id: &str,
        req: WorshipCreate,
    ) -> ServiceResult<WorshipRecord> {
        let memorial = self.access.load_memorial(memorial_id).await?;
        let access = self
            .access
            .evaluate(actor, &memorial, PermissionType::Worship)
            .await?;
        if !access.allowed {
            return Err(ErrorCode::MemorialAccessDenied.into());
        }
        let worship_type = WorshipType::from_db(&req.worship_type).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidWorshipType,
                format!("Unknown worship type: {}", req.worship_type),
            )
        })?;

        let record = WorshipRecord {
            id: new_id(),
            memorial_id: memorial.id,
            user_id: actor.to_string(),
            worship_type,
            content: req.content,
            created_at: now_millis(),
        };
        self.store.insert_worship_record(&record).await?;

        self.ledger
            .sync_worship_activity(actor, &record.memorial_id, worship_type, &record.content)
            .await;
        Ok(record)
    }

    /// Creator only, newest first
    pub async fn list_visitors(
        &self,
        owner: &str,
        memorial_id: &str,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<VisitorRecord>> {
        self.access.ensure_memorial_modify(owner, memorial_id).await?;
        let (rows, total) = self
            .store
            .list_visitors(memorial_id, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    /// Creator only; drops visits older than `retention_days`
    pub async fn cleanup_visitors(
        &self,
        owner: &str,
        memorial_id: &str,
        retention_days: u32,
    ) -> ServiceResult<u64> {
        self.access.ensure_memorial_modify(owner, memorial_id).await?;
        if retention_days == 0 {
            return Err(AppError::validation("retention_days must be at least 1").into());
        }
        let cutoff = now_millis() - i64::from(retention_days) * DAY_MS;
        let removed = self.store.delete_visitors_before(memorial_id, cutoff).await?;
        tracing::info!(memorial_id, removed, retention_days, "Visitor records cleaned up");
        Ok(removed)
    }
}
