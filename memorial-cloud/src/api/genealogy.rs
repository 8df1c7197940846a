//! Genealogy endpoints

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use shared::models::{GenealogyCreate, GenealogyNode, GenealogyTreeNode, GenealogyUpdate};

use super::{ApiResult, ok};
use crate::auth::UserIdentity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/families/{id}/genealogy", get(list).post(create))
        .route("/api/families/{id}/genealogy/tree", get(tree))
        .route(
            "/api/families/{id}/genealogy/{node_id}",
            put(update).delete(delete),
        )
}

/// GET /api/families/{id}/genealogy
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<GenealogyNode>> {
    ok(state
        .services
        .genealogy
        .list_genealogy(&identity.user_id, &id)
        .await?)
}

/// POST /api/families/{id}/genealogy
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<GenealogyCreate>,
) -> ApiResult<GenealogyNode> {
    ok(state
        .services
        .genealogy
        .create_genealogy(&identity.user_id, &id, payload)
        .await?)
}

/// GET /api/families/{id}/genealogy/tree
pub async fn tree(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<GenealogyTreeNode>> {
    ok(state
        .services
        .genealogy
        .genealogy_tree(&identity.user_id, &id)
        .await?)
}

/// PUT /api/families/{id}/genealogy/{node_id}
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, node_id)): Path<(String, String)>,
    Json(payload): Json<GenealogyUpdate>,
) -> ApiResult<GenealogyNode> {
    ok(state
        .services
        .genealogy
        .update_genealogy(&identity.user_id, &id, &node_id, payload)
        .await?)
}

/// DELETE /api/families/{id}/genealogy/{node_id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, node_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .genealogy
        .delete_genealogy(&identity.user_id, &id, &node_id)
        .await?)
}
