//! Family endpoints: lifecycle, invitations, members, memorial links

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{delete as delete_route, get, post, put},
};
use shared::models::{
    Family, FamilyCreate, FamilyDetail, FamilyInvitation, FamilyMember, FamilyUpdate,
    InviteMembersRequest, JoinByCodeRequest, LinkMemorialRequest, Memorial, MemorialFamily,
    RespondInvitationRequest, SetRoleRequest,
};
use shared::request::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, memorial_error, ok};
use crate::auth::UserIdentity;
use crate::auth::rate_limit::join_rate_limit;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let join = Router::new()
        .route("/api/families/join-by-code", post(join_by_code))
        .route_layer(middleware::from_fn_with_state(state, join_rate_limit));

    Router::new()
        .route("/api/families", get(list).post(create))
        .route("/api/families/invitations", get(list_invitations))
        .route(
            "/api/families/invitations/{id}/respond",
            post(respond_invitation),
        )
        .route(
            "/api/families/{id}",
            get(get_by_id).put(update).delete(delete),
        )
        .route("/api/families/{id}/members", get(list_members))
        .route("/api/families/{id}/invite", post(invite))
        .route(
            "/api/families/{id}/members/{user_id}",
            delete_route(remove_member),
        )
        .route("/api/families/{id}/members/{user_id}/role", put(set_role))
        .route("/api/families/{id}/leave", post(leave))
        .route(
            "/api/families/{id}/memorials",
            get(list_memorials).post(add_memorial),
        )
        .route(
            "/api/families/{id}/memorials/{memorial_id}",
            delete_route(remove_memorial),
        )
        .merge(join)
}

/// GET /api/families
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<Family>> {
    ok(state
        .services
        .families
        .list_families(&identity.user_id, &query)
        .await?)
}

/// POST /api/families
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<FamilyCreate>,
) -> ApiResult<Family> {
    ok(state
        .services
        .families
        .create_family(&identity.user_id, payload)
        .await?)
}

/// POST /api/families/join-by-code
pub async fn join_by_code(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<JoinByCodeRequest>,
) -> ApiResult<Family> {
    ok(state
        .services
        .families
        .join_family_by_code(&identity.user_id, &payload.invite_code)
        .await?)
}

/// GET /api/families/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<FamilyInvitation>> {
    ok(state
        .services
        .families
        .list_my_invitations(&identity.user_id)
        .await?)
}

/// POST /api/families/invitations/{id}/respond
pub async fn respond_invitation(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<RespondInvitationRequest>,
) -> ApiResult<FamilyInvitation> {
    ok(state
        .services
        .families
        .respond_to_invitation(&identity.user_id, &id, payload.accept)
        .await?)
}

/// GET /api/families/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<FamilyDetail> {
    ok(state
        .services
        .families
        .get_family(&identity.user_id, &id)
        .await?)
}

/// PUT /api/families/{id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<FamilyUpdate>,
) -> ApiResult<Family> {
    ok(state
        .services
        .families
        .update_family(&identity.user_id, &id, payload)
        .await?)
}

/// DELETE /api/families/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    ok(state
        .services
        .families
        .delete_family(&identity.user_id, &id)
        .await?)
}

/// GET /api/families/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<FamilyMember>> {
    ok(state
        .services
        .families
        .list_members(&identity.user_id, &id, &query)
        .await?)
}

/// POST /api/families/{id}/invite
pub async fn invite(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<InviteMembersRequest>,
) -> ApiResult<Vec<FamilyInvitation>> {
    ok(state
        .services
        .families
        .invite_members(&identity.user_id, &id, payload)
        .await?)
}

/// DELETE /api/families/{id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .families
        .remove_member(&identity.user_id, &id, &user_id)
        .await?)
}

/// PUT /api/families/{id}/members/{user_id}/role
pub async fn set_role(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, user_id)): Path<(String, String)>,
    Json(payload): Json<SetRoleRequest>,
) -> ApiResult<FamilyMember> {
    ok(state
        .services
        .families
        .set_member_role(&identity.user_id, &id, &user_id, &payload.role)
        .await?)
}

/// POST /api/families/{id}/leave
pub async fn leave(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    ok(state
        .services
        .families
        .leave_family(&identity.user_id, &id)
        .await?)
}

/// GET /api/families/{id}/memorials
pub async fn list_memorials(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Memorial>> {
    ok(state
        .services
        .families
        .list_family_memorials(&identity.user_id, &id)
        .await?)
}

/// POST /api/families/{id}/memorials
pub async fn add_memorial(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<LinkMemorialRequest>,
) -> ApiResult<MemorialFamily> {
    ok(state
        .services
        .families
        .add_memorial_to_family(&identity.user_id, &id, &payload.memorial_id)
        .await
        .map_err(memorial_error)?)
}

/// DELETE /api/families/{id}/memorials/{memorial_id}
pub async fn remove_memorial(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, memorial_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .families
        .remove_memorial_from_family(&identity.user_id, &id, &memorial_id)
        .await
        .map_err(memorial_error)?)
}
