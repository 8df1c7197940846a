//! Family activity feed and collective worship endpoints

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use shared::models::{CollectiveWorship, CollectiveWorshipCreate, FamilyActivity};
use shared::request::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, memorial_error, ok};
use crate::auth::UserIdentity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/families/{id}/activities", get(list))
        .route("/api/families/{id}/collective-worship", post(initiate))
        .route(
            "/api/families/{id}/collective-worship/{activity_id}",
            get(get_collective),
        )
        .route(
            "/api/families/{id}/collective-worship/{activity_id}/join",
            post(join),
        )
        .route(
            "/api/families/{id}/collective-worship/{activity_id}/close",
            post(close),
        )
}

/// GET /api/families/{id}/activities
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<FamilyActivity>> {
    ok(state
        .services
        .activities
        .list_activities(&identity.user_id, &id, &query)
        .await?)
}

/// POST /api/families/{id}/collective-worship
pub async fn initiate(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<CollectiveWorshipCreate>,
) -> ApiResult<CollectiveWorship> {
    ok(state
        .services
        .activities
        .initiate_collective_worship(&identity.user_id, &id, payload)
        .await
        .map_err(memorial_error)?)
}

/// GET /api/families/{id}/collective-worship/{activity_id}
pub async fn get_collective(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, activity_id)): Path<(String, String)>,
) -> ApiResult<CollectiveWorship> {
    ok(state
        .services
        .activities
        .get_collective_worship(&identity.user_id, &id, &activity_id)
        .await?)
}

/// POST /api/families/{id}/collective-worship/{activity_id}/join
pub async fn join(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, activity_id)): Path<(String, String)>,
) -> ApiResult<CollectiveWorship> {
    ok(state
        .services
        .activities
        .join_collective_worship(&identity.user_id, &id, &activity_id)
        .await?)
}

/// POST /api/families/{id}/collective-worship/{activity_id}/close
pub async fn close(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, activity_id)): Path<(String, String)>,
) -> ApiResult<CollectiveWorship> {
    ok(state
        .services
        .activities
        .close_collective_worship(&identity.user_id, &id, &activity_id)
        .await?)
}
