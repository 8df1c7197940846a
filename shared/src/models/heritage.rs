//! Family heritage: stories and traditions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum StoryCategory {
    Tradition,
    Achievement,
    Migration,
    Business,
    Education,
    War,
    Love,
}

impl StoryCategory {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "tradition" => Some(Self::Tradition),
            "achievement" => Some(Self::Achievement),
            "migration" => Some(Self::Migration),
            "business" => Some(Self::Business),
            "education" => Some(Self::Education),
            "war" => Some(Self::War),
            "love" => Some(Self::Love),
            _ => None,
        }
    }
}

/// Family story. Tag/character/media lists are stored as typed arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FamilyStory {
    pub id: String,
    pub family_id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub category: StoryCategory,
    pub period: Option<String>,
    pub characters: Vec<String>,
    pub location: Option<String>,
    pub media_files: Vec<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub view_count: i64,
    pub like_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCreate {
    pub title: String,
    pub content: String,
    pub category: String,
    pub period: Option<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub media_files: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub period: Option<String>,
    pub characters: Option<Vec<String>>,
    pub location: Option<String>,
    pub media_files: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum TraditionCategory {
    Festival,
    Ceremony,
    Custom,
    Rule,
    Recipe,
}

impl TraditionCategory {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "festival" => Some(Self::Festival),
            "ceremony" => Some(Self::Ceremony),
            "custom" => Some(Self::Custom),
            "rule" => Some(Self::Rule),
            "recipe" => Some(Self::Recipe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FamilyTradition {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: TraditionCategory,
    pub origin: Option<String>,
    pub practice: Option<String>,
    pub meaning: Option<String>,
    pub media_files: Vec<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraditionCreate {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub origin: Option<String>,
    pub practice: Option<String>,
    pub meaning: Option<String>,
    #[serde(default)]
    pub media_files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraditionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub origin: Option<String>,
    pub practice: Option<String>,
    pub meaning: Option<String>,
    pub media_files: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Optional category filter for list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_tags_round_trip_as_arrays() {
        let json = r#"{"title":"t","content":"c","category":"migration","tags":["a, b","c"]}"#;
        let create: StoryCreate = serde_json::from_str(json).unwrap();
        assert_eq!(create.tags, vec!["a, b".to_string(), "c".to_string()]);
        assert!(create.is_public);
        assert!(create.characters.is_empty());
    }

    #[test]
    fn category_parsing() {
        assert_eq!(StoryCategory::from_db("war"), Some(StoryCategory::War));
        assert_eq!(StoryCategory::from_db("gossip"), None);
        assert_eq!(
            TraditionCategory::from_db("recipe"),
            Some(TraditionCategory::Recipe)
        );
        assert_eq!(TraditionCategory::from_db("party"), None);
    }
}
