//! Activity Ledger
//!
//! Best-effort append log of family events, plus collective worship whose
//! participant set lives in its own table.

use std::sync::Arc;

use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, CollectiveWorship, CollectiveWorshipContent, CollectiveWorshipCreate,
    CollectiveWorshipParticipant, CollectiveWorshipStatus, FamilyActivity, WorshipType,
};
use shared::request::{PaginatedResponse, PaginationQuery};
use shared::util::{new_id, now_millis};

use super::access::AccessEvaluator;
use crate::db::Store;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct ActivityLedger {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
}

impl ActivityLedger {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator) -> Self {
        Self { store, access }
    }

    /// Append an activity row. Failures are logged and swallowed.
    pub async fn record(
        &self,
        family_id: &str,
        user_id: &str,
        memorial_id: Option<&str>,
        activity_type: ActivityType,
        content: Value,
    ) {
        let activity = FamilyActivity {
            id: new_id(),
            family_id: family_id.to_string(),
            user_id: user_id.to_string(),
            memorial_id: memorial_id.map(str::to_string),
            activity_type,
            content,
            created_at: now_millis(),
        };
        if let Err(e) = self.store.insert_activity(&activity).await {
            tracing::warn!(
                family_id,
                user_id,
                activity_type = ?activity_type,
                error = %e,
                "Failed to record family activity"
            );
        }
    }

    pub async fn list_activities(
        &self,
        actor: &str,
        family_id: &str,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<FamilyActivity>> {
        self.access.require_family_member(actor, family_id).await?;
        let (rows, total) = self
            .store
            .list_activities(family_id, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    /// Record a `worship` activity in every family linked to the memorial
    /// that the actor belongs to. Never fails the caller.
    pub async fn sync_worship_activity(
        &self,
        actor: &str,
        memorial_id: &str,
        worship_type: WorshipType,
        content: &Value,
    ) {
        let families = match self
            .store
            .member_family_ids_for_memorial(memorial_id, actor)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(memorial_id, actor, error = %e, "Worship sync lookup failed");
                return;
            }
        };

        for family_id in families {
            self.record(
                &family_id,
                actor,
                Some(memorial_id),
                ActivityType::Worship,
                json!({ "worship_type": worship_type, "content": content }),
            )
            .await;
        }
    }

    pub async fn initiate_collective_worship(
        &self,
        actor: &str,
        family_id: &str,
        req: CollectiveWorshipCreate,
    ) -> ServiceResult<CollectiveWorship> {
        self.access.require_family_admin(actor, family_id).await?;

        let worship_type = WorshipType::from_db(&req.worship_type).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidWorshipType,
                format!("Unknown worship type: {}", req.worship_type),
            )
        })?;
        if !self
            .store
            .is_memorial_linked(family_id, &req.memorial_id)
            .await?
        {
            return Err(ErrorCode::MemorialNotLinked.into());
        }
        self.access.load_memorial(&req.memorial_id).await?;

        let description = CollectiveWorshipContent {
            worship_type,
            content: req.content,
            schedule_time: req.schedule_time,
            initiator_id: actor.to_string(),
            status: CollectiveWorshipStatus::Active,
        };
        let now = now_millis();
        let activity = FamilyActivity {
            id: new_id(),
            family_id: family_id.to_string(),
            user_id: actor.to_string(),
            memorial_id: Some(req.memorial_id),
            activity_type: ActivityType::CollectiveWorship,
            content: serde_json::to_value(&description)
                .map_err(|e| AppError::internal(e.to_string()))?,
            created_at: now,
        };
        let initiator = CollectiveWorshipParticipant {
            activity_id: activity.id.clone(),
            user_id: actor.to_string(),
            joined_at: now,
        };

        self.store
            .create_collective_worship(&activity, &initiator)
            .await?;
        tracing::info!(
            family_id,
            activity_id = %activity.id,
            initiator = actor,
            "Collective worship initiated"
        );

        Ok(CollectiveWorship {
            activity,
            description,
            participants: vec![initiator],
        })
    }

    pub async fn join_collective_worship(
        &self,
        actor: &str,
        family_id: &str,
        activity_id: &str,
    ) -> ServiceResult<CollectiveWorship> {
        self.access.require_family_member(actor, family_id).await?;
        let (activity, description) = self.load_collective(family_id, activity_id).await?;
        if description.status != CollectiveWorshipStatus::Active {
            return Err(ErrorCode::CollectiveWorshipClosed.into());
        }

        let participant = CollectiveWorshipParticipant {
            activity_id: activity.id.clone(),
            user_id: actor.to_string(),
            joined_at: now_millis(),
        };
        if !self.store.add_participant(&participant).await? {
            return Err(ErrorCode::AlreadyParticipating.into());
        }

        self.record(
            family_id,
            actor,
            activity.memorial_id.as_deref(),
            ActivityType::JoinCollectiveWorship,
            json!({ "activity_id": activity.id }),
        )
        .await;

        let participants = self.store.list_participants(&activity.id).await?;
        Ok(CollectiveWorship {
            activity,
            description,
            participants,
        })
    }

    /// Initiator or a family admin may close
    pub async fn close_collective_worship(
        &self,
        actor: &str,
        family_id: &str,
        activity_id: &str,
    ) -> ServiceResult<CollectiveWorship> {
        let (_, role) = self.access.require_family_member(actor, family_id).await?;
        let (mut activity, mut description) = self.load_collective(family_id, activity_id).await?;
        if description.initiator_id != actor && !role.is_admin() {
            return Err(ErrorCode::FamilyAdminRequired.into());
        }
        if description.status == CollectiveWorshipStatus::Closed {
            return Err(ErrorCode::CollectiveWorshipClosed.into());
        }

        description.status = CollectiveWorshipStatus::Closed;
        activity.content = serde_json::to_value(&description)
            .map_err(|e| AppError::internal(e.to_string()))?;
        if !self
            .store
            .update_activity_content(&activity.id, &activity.content)
            .await?
        {
            return Err(ErrorCode::ActivityNotFound.into());
        }

        self.record(
            family_id,
            actor,
            activity.memorial_id.as_deref(),
            ActivityType::CloseCollectiveWorship,
            json!({ "activity_id": activity.id }),
        )
        .await;

        let participants = self.store.list_participants(&activity.id).await?;
        Ok(CollectiveWorship {
            activity,
            description,
            participants,
        })
    }

    pub async fn get_collective_worship(
        &self,
        actor: &str,
        family_id: &str,
        activity_id: &str,
    ) -> ServiceResult<CollectiveWorship> {
        self.access.require_family_member(actor, family_id).await?;
        let (activity, description) = self.load_collective(family_id, activity_id).await?;
        let participants = self.store.list_participants(&activity.id).await?;
        Ok(CollectiveWorship {
            activity,
            description,
            participants,
        })
    }

    /// Collective-worship activity of this family with its decoded description
    async fn load_collective(
        &self,
        family_id: &str,
        activity_id: &str,
    ) -> ServiceResult<(FamilyActivity, CollectiveWorshipContent)> {
        let activity = self
            .store
            .find_activity(activity_id)
            .await?
            .filter(|a| a.family_id == family_id)
            .filter(|a| a.activity_type == ActivityType::CollectiveWorship)
            .ok_or(ErrorCode::ActivityNotFound)?;

        let description: CollectiveWorshipContent =
            serde_json::from_value(activity.content.clone()).map_err(|e| {
                AppError::with_message(ErrorCode::InvalidActivityContent, e.to_string())
            })?;
        Ok((activity, description))
    }
}
