//! Memorial endpoints

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
};
use serde::Deserialize;
use shared::models::{
    Memorial, MemorialAccess, MemorialCreate, MemorialUpdate, VisitorRecord, WorshipCreate,
    WorshipRecord,
};
use shared::request::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, memorial_error, ok};
use crate::auth::UserIdentity;
use crate::auth::rate_limit::forwarded_ip;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/memorials", get(list).post(create))
        .route(
            "/api/memorials/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/api/memorials/{id}/access", get(access))
        .route("/api/memorials/{id}/worship", post(worship))
        .route("/api/memorials/{id}/visitors", get(list_visitors))
        .route("/api/memorials/{id}/visitors/cleanup", post(cleanup_visitors))
}

/// GET /api/memorials
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<Memorial>> {
    ok(state
        .services
        .access
        .list_accessible_memorials(&identity.user_id, &query)
        .await?)
}

/// POST /api/memorials
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<MemorialCreate>,
) -> ApiResult<Memorial> {
    ok(state
        .services
        .memorials
        .create_memorial(&identity.user_id, payload)
        .await?)
}

/// GET /api/memorials/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Memorial> {
    ok(state
        .services
        .memorials
        .get_memorial(&identity.user_id, &id, forwarded_ip(&headers))
        .await
        .map_err(memorial_error)?)
}

/// PUT /api/memorials/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<MemorialUpdate>,
) -> ApiResult<Memorial> {
    ok(state
        .services
        .memorials
        .update_memorial(&identity.user_id, &id, payload)
        .await
        .map_err(memorial_error)?)
}

/// DELETE /api/memorials/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    ok(state
        .services
        .memorials
        .delete_memorial(&identity.user_id, &id)
        .await
        .map_err(memorial_error)?)
}

/// GET /api/memorials/{id}/access
///
/// Callers who cannot see the memorial get the same 404 as for a missing id.
pub async fn access(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<MemorialAccess> {
    let (_, access) = state
        .services
        .access
        .ensure_memorial_access(&identity.user_id, &id)
        .await
        .map_err(memorial_error)?;
    ok(access)
}

/// POST /api/memorials/{id}/worship
pub async fn worship(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<WorshipCreate>,
) -> ApiResult<WorshipRecord> {
    ok(state
        .services
        .memorials
        .worship(&identity.user_id, &id, payload)
        .await
        .map_err(memorial_error)?)
}

/// GET /api/memorials/{id}/visitors
pub async fn list_visitors(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<VisitorRecord>> {
    ok(state
        .services
        .memorials
        .list_visitors(&identity.user_id, &id, &query)
        .await
        .map_err(memorial_error)?)
}

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    90
}

#[derive(Debug, serde::Serialize)]
pub struct CleanupResult {
    pub removed: u64,
}

/// POST /api/memorials/{id}/visitors/cleanup
pub async fn cleanup_visitors(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<CleanupRequest>,
) -> ApiResult<CleanupResult> {
    let removed = state
        .services
        .memorials
        .cleanup_visitors(&identity.user_id, &id, payload.retention_days)
        .await
        .map_err(memorial_error)?;
    ok(CleanupResult { removed })
}
