//! Family activity ledger Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::memorial::WorshipType;

/// Ledger event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "text", rename_all = "snake_case"))]
pub enum ActivityType {
    Join,
    Leave,
    RemoveMember,
    SetRole,
    AddMemorial,
    RemoveMemorial,
    Worship,
    CollectiveWorship,
    JoinCollectiveWorship,
    CloseCollectiveWorship,
    CreateGenealogy,
    CreateStory,
    CreateTradition,
    SetReminder,
    DeleteReminder,
}

/// Ledger row. `content` is free-form JSON except for collective worship,
/// where it decodes to [`CollectiveWorshipContent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FamilyActivity {
    pub id: String,
    pub family_id: String,
    pub user_id: String,
    pub memorial_id: Option<String>,
    pub activity_type: ActivityType,
    pub content: Value,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectiveWorshipStatus {
    Active,
    Closed,
}

/// Event description stored in a collective-worship activity.
/// Participants live in their own table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectiveWorshipContent {
    pub worship_type: WorshipType,
    #[serde(default)]
    pub content: Value,
    pub schedule_time: Option<i64>,
    pub initiator_id: String,
    pub status: CollectiveWorshipStatus,
}

/// One participant, unique per (activity_id, user_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CollectiveWorshipParticipant {
    pub activity_id: String,
    pub user_id: String,
    pub joined_at: i64,
}

/// Collective worship with its decoded description and participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiveWorship {
    pub activity: FamilyActivity,
    pub description: CollectiveWorshipContent,
    pub participants: Vec<CollectiveWorshipParticipant>,
}

/// Initiate collective worship payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiveWorshipCreate {
    pub memorial_id: String,
    pub worship_type: String,
    #[serde(default)]
    pub content: Value,
    pub schedule_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collective_worship_content_decodes_from_activity_json() {
        let json = serde_json::json!({
            "worship_type": "candle",
            "content": {"text": "for grandma"},
            "schedule_time": null,
            "initiator_id": "u1",
            "status": "active",
        });
        let content: CollectiveWorshipContent = serde_json::from_value(json).unwrap();
        assert_eq!(content.worship_type, WorshipType::Candle);
        assert_eq!(content.status, CollectiveWorshipStatus::Active);
    }

    #[test]
    fn malformed_content_is_rejected() {
        let json = serde_json::json!({"worship_type": "candle"});
        assert!(serde_json::from_value::<CollectiveWorshipContent>(json).is_err());
    }
}
