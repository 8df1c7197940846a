//! Privacy endpoints: settings, access checks, access requests, blacklist

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AccessRequest, AccessRequestStatus, BlacklistEntry, BlacklistRequest, HandleAccessRequest,
    PermissionType, PrivacySettings, PrivacySettingsRequest, RequestAccessRequest,
};
use shared::request::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, memorial_error, ok};
use crate::auth::UserIdentity;
use crate::auth::rate_limit::access_request_rate_limit;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let request_access = Router::new()
        .route(
            "/api/privacy/memorials/{id}/request-access",
            post(request_access),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            access_request_rate_limit,
        ));

    Router::new()
        .route("/api/privacy/memorials/settings", post(set_settings))
        .route("/api/privacy/memorials/{id}/settings", get(get_settings))
        .route("/api/privacy/memorials/{id}/access", get(check_access))
        .route(
            "/api/privacy/memorials/{id}/access-requests",
            get(list_access_requests),
        )
        .route(
            "/api/privacy/access-requests/{id}/handle",
            post(handle_access_request),
        )
        .route(
            "/api/privacy/memorials/{id}/blacklist/{user_id}",
            post(add_to_blacklist).delete(remove_from_blacklist),
        )
        .merge(request_access)
}

/// POST /api/privacy/memorials/settings
pub async fn set_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<PrivacySettingsRequest>,
) -> ApiResult<PrivacySettings> {
    ok(state
        .services
        .privacy
        .set_memorial_privacy(&identity.user_id, payload)
        .await
        .map_err(memorial_error)?)
}

/// GET /api/privacy/memorials/{id}/settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<PrivacySettings> {
    ok(state
        .services
        .privacy
        .get_privacy_settings(&identity.user_id, &id)
        .await
        .map_err(memorial_error)?)
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub permission: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccessCheck {
    pub permission: PermissionType,
    pub allowed: bool,
}

/// GET /api/privacy/memorials/{id}/access?permission=view
pub async fn check_access(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<AccessQuery>,
) -> ApiResult<AccessCheck> {
    let permission = match query.permission.as_deref() {
        None => PermissionType::View,
        Some(name) => PermissionType::from_db(name).ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidPermissionType,
                format!("Unknown permission type: {name}"),
            )
        })?,
    };
    // Only callers who can see the memorial learn anything about it
    state
        .services
        .access
        .ensure_memorial_access(&identity.user_id, &id)
        .await
        .map_err(memorial_error)?;
    let allowed = state
        .services
        .privacy
        .check_user_access(&identity.user_id, &id, permission)
        .await
        .map_err(memorial_error)?;
    ok(AccessCheck {
        permission,
        allowed,
    })
}

/// POST /api/privacy/memorials/{id}/request-access
pub async fn request_access(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<RequestAccessRequest>,
) -> ApiResult<AccessRequest> {
    ok(state
        .services
        .privacy
        .request_access(&identity.user_id, &id, payload.message)
        .await
        .map_err(memorial_error)?)
}

#[derive(Debug, Default, Deserialize)]
pub struct AccessRequestQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<AccessRequestStatus>,
}

/// GET /api/privacy/memorials/{id}/access-requests
pub async fn list_access_requests(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<AccessRequestQuery>,
) -> ApiResult<PaginatedResponse<AccessRequest>> {
    let default = PaginationQuery::default();
    let page = PaginationQuery::new(
        query.page.unwrap_or(default.page),
        query.per_page.unwrap_or(default.per_page),
    );
    ok(state
        .services
        .privacy
        .list_access_requests(&identity.user_id, &id, query.status, &page)
        .await
        .map_err(memorial_error)?)
}

/// POST /api/privacy/access-requests/{id}/handle
pub async fn handle_access_request(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<HandleAccessRequest>,
) -> ApiResult<AccessRequest> {
    ok(state
        .services
        .privacy
        .handle_access_request(
            &identity.user_id,
            &id,
            payload.approve,
            &payload.permissions,
        )
        .await
        .map_err(memorial_error)?)
}

/// POST /api/privacy/memorials/{id}/blacklist/{user_id}
pub async fn add_to_blacklist(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, user_id)): Path<(String, String)>,
    payload: Option<Json<BlacklistRequest>>,
) -> ApiResult<BlacklistEntry> {
    let reason = payload.and_then(|Json(body)| body.reason);
    ok(state
        .services
        .privacy
        .add_to_blacklist(&identity.user_id, &id, &user_id, reason)
        .await
        .map_err(memorial_error)?)
}

/// DELETE /api/privacy/memorials/{id}/blacklist/{user_id}
pub async fn remove_from_blacklist(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .privacy
        .remove_from_blacklist(&identity.user_id, &id, &user_id)
        .await
        .map_err(memorial_error)?)
}
