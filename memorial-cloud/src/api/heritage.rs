//! Family heritage endpoints: stories, traditions, reminders

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    routing::{delete as delete_route, get, put},
};
use shared::models::{
    CategoryQuery, FamilyStory, FamilyTradition, MemorialReminder, ReminderCreate, StoryCreate,
    StoryUpdate, TraditionCreate, TraditionUpdate,
};
use shared::request::{PaginatedResponse, PaginationQuery};

use super::{ApiResult, memorial_error, ok};
use crate::auth::UserIdentity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/families/{id}/stories", get(list_stories).post(create_story))
        .route(
            "/api/families/{id}/stories/{story_id}",
            get(get_story).put(update_story).delete(delete_story),
        )
        .route(
            "/api/families/{id}/traditions",
            get(list_traditions).post(create_tradition),
        )
        .route(
            "/api/families/{id}/traditions/{tradition_id}",
            put(update_tradition).delete(delete_tradition),
        )
        .route(
            "/api/families/{id}/reminders",
            get(list_reminders).post(set_reminder),
        )
        .route("/api/families/{id}/reminders/upcoming", get(upcoming_reminders))
        .route(
            "/api/families/{id}/reminders/{reminder_id}",
            delete_route(delete_reminder),
        )
}

/// Query strings do not survive `#[serde(flatten)]` with numeric fields,
/// so paging is spelled out here
#[derive(Debug, Default, serde::Deserialize)]
pub struct StoryListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<String>,
}

impl StoryListQuery {
    fn pagination(&self) -> PaginationQuery {
        let default = PaginationQuery::default();
        PaginationQuery::new(
            self.page.unwrap_or(default.page),
            self.per_page.unwrap_or(default.per_page),
        )
    }
}

// ── Stories ─────────────────────────────────────────────────────────

/// GET /api/families/{id}/stories
pub async fn list_stories(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<StoryListQuery>,
) -> ApiResult<PaginatedResponse<FamilyStory>> {
    ok(state
        .services
        .heritage
        .list_stories(
            &identity.user_id,
            &id,
            query.category.as_deref(),
            &query.pagination(),
        )
        .await?)
}

/// POST /api/families/{id}/stories
pub async fn create_story(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<StoryCreate>,
) -> ApiResult<FamilyStory> {
    ok(state
        .services
        .heritage
        .create_story(&identity.user_id, &id, payload)
        .await?)
}

/// GET /api/families/{id}/stories/{story_id}
pub async fn get_story(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, story_id)): Path<(String, String)>,
) -> ApiResult<FamilyStory> {
    ok(state
        .services
        .heritage
        .get_story(&identity.user_id, &id, &story_id)
        .await?)
}

/// PUT /api/families/{id}/stories/{story_id}
pub async fn update_story(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, story_id)): Path<(String, String)>,
    Json(payload): Json<StoryUpdate>,
) -> ApiResult<FamilyStory> {
    ok(state
        .services
        .heritage
        .update_story(&identity.user_id, &id, &story_id, payload)
        .await?)
}

/// DELETE /api/families/{id}/stories/{story_id}
pub async fn delete_story(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, story_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .heritage
        .delete_story(&identity.user_id, &id, &story_id)
        .await?)
}

// ── Traditions ──────────────────────────────────────────────────────

/// GET /api/families/{id}/traditions
pub async fn list_traditions(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Vec<FamilyTradition>> {
    ok(state
        .services
        .heritage
        .list_traditions(&identity.user_id, &id, query.category.as_deref())
        .await?)
}

/// POST /api/families/{id}/traditions
pub async fn create_tradition(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<TraditionCreate>,
) -> ApiResult<FamilyTradition> {
    ok(state
        .services
        .heritage
        .create_tradition(&identity.user_id, &id, payload)
        .await?)
}

/// PUT /api/families/{id}/traditions/{tradition_id}
pub async fn update_tradition(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, tradition_id)): Path<(String, String)>,
    Json(payload): Json<TraditionUpdate>,
) -> ApiResult<FamilyTradition> {
    ok(state
        .services
        .heritage
        .update_tradition(&identity.user_id, &id, &tradition_id, payload)
        .await?)
}

/// DELETE /api/families/{id}/traditions/{tradition_id}
pub async fn delete_tradition(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, tradition_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .heritage
        .delete_tradition(&identity.user_id, &id, &tradition_id)
        .await?)
}

// ── Reminders ───────────────────────────────────────────────────────

/// GET /api/families/{id}/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MemorialReminder>> {
    ok(state
        .services
        .reminders
        .list_reminders(&identity.user_id, &id)
        .await?)
}

/// POST /api/families/{id}/reminders
pub async fn set_reminder(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
    Json(payload): Json<ReminderCreate>,
) -> ApiResult<MemorialReminder> {
    ok(state
        .services
        .reminders
        .set_reminder(&identity.user_id, &id, payload)
        .await
        .map_err(memorial_error)?)
}

/// GET /api/families/{id}/reminders/upcoming
pub async fn upcoming_reminders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MemorialReminder>> {
    let today = chrono::Utc::now().date_naive();
    ok(state
        .services
        .reminders
        .upcoming_reminders(&identity.user_id, &id, today)
        .await?)
}

/// DELETE /api/families/{id}/reminders/{reminder_id}
pub async fn delete_reminder(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((id, reminder_id)): Path<(String, String)>,
) -> ApiResult<()> {
    ok(state
        .services
        .reminders
        .delete_reminder(&identity.user_id, &id, &reminder_id)
        .await?)
}
