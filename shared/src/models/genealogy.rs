//! Genealogy Model (family tree nodes)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Tree node. `generation` is caller-supplied, not derived from depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GenealogyNode {
    pub id: String,
    pub family_id: String,
    pub person_name: String,
    pub generation: i32,
    pub parent_id: Option<String>,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub memorial_id: Option<String>,
    pub position: Option<String>,
    pub achievements: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create node payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenealogyCreate {
    pub person_name: String,
    pub generation: i32,
    pub parent_id: Option<String>,
    pub gender: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub memorial_id: Option<String>,
    pub position: Option<String>,
    pub achievements: Option<String>,
}

/// Update node payload (absent fields are left unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenealogyUpdate {
    pub person_name: Option<String>,
    pub generation: Option<i32>,
    pub parent_id: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub biography: Option<String>,
    pub avatar_url: Option<String>,
    pub memorial_id: Option<String>,
    pub position: Option<String>,
    pub achievements: Option<String>,
}

/// Nested view of the tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenealogyTreeNode {
    #[serde(flatten)]
    pub node: GenealogyNode,
    pub children: Vec<GenealogyTreeNode>,
}
