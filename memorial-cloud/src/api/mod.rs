//! HTTP API for memorial-cloud
//!
//! Every route under `/api` requires a user bearer token. Responses use the
//! `ApiResponse` envelope.

pub mod activity;
pub mod families;
pub mod genealogy;
pub mod health;
pub mod heritage;
pub mod memorials;
pub mod privacy;

use axum::routing::get;
use axum::{Json, Router, middleware};
use http::{HeaderName, Method};
use shared::error::{ApiResponse, AppError};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::user_auth_middleware;
use crate::error::{ServiceError, conceal_memorial};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Wrap a payload in the success envelope
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

/// Error mapping for memorial-scoped routes: hides whether the memorial exists
pub fn memorial_error(e: ServiceError) -> AppError {
    conceal_memorial(e.into())
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(memorials::router())
        .merge(families::router(state.clone()))
        .merge(activity::router())
        .merge(genealogy::router())
        .merge(heritage::router())
        .merge(privacy::router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api)
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
