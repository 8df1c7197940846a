//! Family heritage: stories and traditions

use std::sync::Arc;

use serde_json::json;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ActivityType, FamilyStory, FamilyTradition, StoryCategory, StoryCreate, StoryUpdate,
    TraditionCategory, TraditionCreate, TraditionUpdate,
};
use shared::request::{PaginatedResponse, PaginationQuery};
use shared::util::{new_id, now_millis};
use shared::validation::{
    MAX_LIST_LEN, MAX_NAME_LEN, MAX_TEXT_LEN, non_blank, validate_list_len,
    validate_optional_text, validate_required_text,
};

use super::access::AccessEvaluator;
use super::activity::ActivityLedger;
use crate::db::Store;
use crate::error::ServiceResult;

#[derive(Clone)]
pub struct HeritageService {
    store: Arc<dyn Store>,
    access: AccessEvaluator,
    ledger: ActivityLedger,
}

pub fn parse_story_category(value: &str) -> Result<StoryCategory, AppError> {
    StoryCategory::from_db(value).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::InvalidStoryCategory,
            format!("Unknown story category: {value}"),
        )
    })
}

pub fn parse_tradition_category(value: &str) -> Result<TraditionCategory, AppError> {
    TraditionCategory::from_db(value).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::InvalidTraditionCategory,
            format!("Unknown tradition category: {value}"),
        )
    })
}

fn validate_story_lists(
    characters: &[String],
    media_files: &[String],
    tags: &[String],
) -> Result<(), AppError> {
    validate_list_len(characters, "characters", MAX_LIST_LEN)?;
    validate_list_len(media_files, "media_files", MAX_LIST_LEN)?;
    validate_list_len(tags, "tags", MAX_LIST_LEN)
}

impl HeritageService {
    pub fn new(store: Arc<dyn Store>, access: AccessEvaluator, ledger: ActivityLedger) -> Self {
        Self {
            store,
            access,
            ledger,
        }
    }

    // ── Stories ─────────────────────────────────────────────────────

    pub async fn create_story(
        &self,
        actor: &str,
        family_id: &str,
        req: StoryCreate,
    ) -> ServiceResult<FamilyStory> {
        self.access.require_family_member(actor, family_id).await?;

        validate_required_text(&req.title, "title", MAX_NAME_LEN)?;
        validate_required_text(&req.content, "content", MAX_TEXT_LEN)?;
        validate_optional_text(&req.period, "period", MAX_NAME_LEN)?;
        validate_optional_text(&req.location, "location", MAX_NAME_LEN)?;
        validate_story_lists(&req.characters, &req.media_files, &req.tags)?;
        let category = parse_story_category(&req.category)?;

        let now = now_millis();
        let story = FamilyStory {
            id: new_id(),
            family_id: family_id.to_string(),
            author_id: actor.to_string(),
            title: req.title.trim().to_string(),
            content: req.content,
            category,
            period: req.period,
            characters: req.characters,
            location: req.location,
            media_files: req.media_files,
            tags: req.tags,
            is_public: req.is_public,
            view_count: 0,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_story(&story).await?;

        self.ledger
            .record(
                family_id,
                actor,
                None,
                ActivityType::CreateStory,
                json!({ "story_id": story.id, "title": story.title }),
            )
            .await;
        Ok(story)
    }

    /// Public stories only, newest first
    pub async fn list_stories(
        &self,
        actor: &str,
        family_id: &str,
        category: Option<&str>,
        query: &PaginationQuery,
    ) -> ServiceResult<PaginatedResponse<FamilyStory>> {
        self.access.require_family_member(actor, family_id).await?;
        let category = category.map(parse_story_category).transpose()?;
        let (rows, total) = self
            .store
            .list_stories(family_id, category, query.offset(), query.limit() as i64)
            .await?;
        Ok(PaginatedResponse::new(rows, total, query))
    }

    /// Counts a view on every read
    pub async fn get_story(
        &self,
        actor: &str,
        family_id: &str,
        story_id: &str,
    ) -> ServiceResult<FamilyStory> {
        self.access.require_family_member(actor, family_id).await?;
        let mut story = self.load_story(family_id, story_id).await?;
        self.store.increment_story_views(&story.id).await?;
        story.view_count += 1;
        Ok(story)
    }

    /// Author or family admin
    pub async fn update_story(
        &self,
        actor: &str,
        family_id: &str,
        story_id: &str,
        req: StoryUpdate,
    ) -> ServiceResult<FamilyStory> {
        let (_, role) = self.access.require_family_member(actor, family_id).await?;
        let mut story = self.load_story(family_id, story_id).await?;
        if story.author_id != actor && !role.is_admin() {
            return Err(ErrorCode::FamilyAdminRequired.into());
        }

        if let Some(title) = &req.title {
            validate_required_text(title, "title", MAX_NAME_LEN)?;
            story.title = title.trim().to_string();
        }
        if let Some(content) = req.content {
            validate_required_text(&content, "content", MAX_TEXT_LEN)?;
            story.content = content;
        }
        if let Some(category) = &req.category {
            story.category = parse_story_category(category)?;
        }
        validate_optional_text(&req.period, "period", MAX_NAME_LEN)?;
        validate_optional_text(&req.location, "location", MAX_NAME_LEN)?;
        if req.period.is_some() {
            story.period = non_blank(&req.period).map(str::to_string);
        }
        if req.location.is_some() {
            story.location = non_blank(&req.location).map(str::to_string);
        }
        if let Some(characters) = req.characters {
            story.characters = characters;
        }
        if let Some(media_files) = req.media_files {
            story.media_files = media_files;
        }
        if let Some(tags) = req.tags {
            story.tags = tags;
        }
        validate_story_lists(&story.characters, &story.media_files, &story.tags)?;
        if let Some(is_public) = req.is_public {
            story.is_public = is_public;
        }
        story.updated_at = now_millis();

        self.store.update_story(&story).await?;
        Ok(story)
    }

    /// Author or family admin
    pub async fn delete_story(
        &self,
        actor: &str,
        family_id: &str,
        story_id: &str,
    ) -> ServiceResult<()> {
        let (_, role) = self.access.require_family_member(actor, family_id).await?;
        let story = self.load_story(family_id, story_id).await?;
        if story.author_id != actor && !role.is_admin() {
            return Err(ErrorCode::FamilyAdminRequired.into());
        }
        if !self.store.delete_story(&story.id).await? {
            return Err(ErrorCode::StoryNotFound.into());
        }
        Ok(())
    }

    async fn load_story(&self, family_id: &str, story_id: &str) -> ServiceResult<FamilyStory> {
        self.store
            .find_story(story_id)
            .await?
            .filter(|s| s.family_id == family_id)
            .ok_or_else(|| ErrorCode::StoryNotFound.into())
    }

    // ── Traditions ──────────────────────────────────────────────────

    pub async fn create_tradition(
        &self,
        actor: &str,
        family_id: &str,
        req: TraditionCreate,
    ) -> ServiceResult<FamilyTradition> {
        self.access.require_family_admin(actor, family_id).await?;

        validate_required_text(&req.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&req.description, "description", MAX_TEXT_LEN)?;
        validate_optional_text(&req.origin, "origin", MAX_TEXT_LEN)?;
        validate_optional_text(&req.practice, "practice", MAX_TEXT_LEN)?;
        validate_optional_text(&req.meaning, "meaning", MAX_TEXT_LEN)?;
        validate_list_len(&req.media_files, "media_files", MAX_LIST_LEN)?;
        let category = parse_tradition_category(&req.category)?;

        let now = now_millis();
        let tradition = FamilyTradition {
            id: new_id(),
            family_id: family_id.to_string(),
            name: req.name.trim().to_string(),
            description: req.description,
            category,
            origin: req.origin,
            practice: req.practice,
            meaning: req.meaning,
            media_files: req.media_files,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tradition(&tradition).await?;

        self.ledger
            .record(
                family_id,
                actor,
                None,
                ActivityType::CreateTradition,
                json!({ "tradition_id": tradition.id, "name": tradition.name }),
            )
            .await;
        Ok(tradition)
    }

    pub async fn list_traditions(
        &self,
        actor: &str,
        family_id: &str,
        category: Option<&str>,
    ) -> ServiceResult<Vec<FamilyTradition>> {
        self.access.require_family_member(actor, family_id).await?;
        let category = category.map(parse_tradition_category).transpose()?;
        Ok(self.store.list_traditions(family_id, category).await?)
    }

    pub async fn update_tradition(
        &self,
        actor: &str,
        family_id: &str,
        tradition_id: &str,
        req: TraditionUpdate,
    ) -> ServiceResult<FamilyTradition> {
        self.access.require_family_admin(actor, family_id).await?;
        let mut tradition = self.load_tradition(family_id, tradition_id).await?;

        if let Some(name) = &req.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
            tradition.name = name.trim().to_string();
        }
        if let Some(category) = &req.category {
            tradition.category = parse_tradition_category(category)?;
        }
        validate_optional_text(&req.description, "description", MAX_TEXT_LEN)?;
        validate_optional_text(&req.origin, "origin", MAX_TEXT_LEN)?;
        validate_optional_text(&req.practice, "practice", MAX_TEXT_LEN)?;
        validate_optional_text(&req.meaning, "meaning", MAX_TEXT_LEN)?;
        if req.description.is_some() {
            tradition.description = non_blank(&req.description).map(str::to_string);
        }
        if req.origin.is_some() {
            tradition.origin = non_blank(&req.origin).map(str::to_string);
        }
        if req.practice.is_some() {
            tradition.practice = non_blank(&req.practice).map(str::to_string);
        }
        if req.meaning.is_some() {
            tradition.meaning = non_blank(&req.meaning).map(str::to_string);
        }
        if let Some(media_files) = req.media_files {
            validate_list_len(&media_files, "media_files", MAX_LIST_LEN)?;
            tradition.media_files = media_files;
        }
        if let Some(is_active) = req.is_active {
            tradition.is_active = is_active;
        }
        tradition.updated_at = now_millis();

        self.store.update_tradition(&tradition).await?;
        Ok(tradition)
    }

    pub async fn delete_tradition(
        &self,
        actor: &str,
        family_id: &str,
        tradition_id: &str,
    ) -> ServiceResult<()> {
        self.access.require_family_admin(actor, family_id).await?;
        let tradition = self.load_tradition(family_id, tradition_id).await?;
        if !self.store.delete_tradition(&tradition.id).await? {
            return Err(ErrorCode::TraditionNotFound.into());
        }
        Ok(())
    }

    async fn load_tradition(
        &self,
        family_id: &str,
        tradition_id: &str,
    ) -> ServiceResult<FamilyTradition> {
        self.store
            .find_tradition(tradition_id)
            .await?
            .filter(|t| t.family_id == family_id)
            .ok_or_else(|| ErrorCode::TraditionNotFound.into())
    }
}
