use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// One garment detected in the uploaded wardrobe video.
///
/// Everything but `id` is tolerant of omission: the upstream model is asked
/// for the full schema but only probabilistically complies.
#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClothingItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub subtype: Option<String>,
    pub primary_color: Option<String>,
    pub patterns: Option<String>,
    pub season: Option<String>,
    pub formality: Option<u8>,
    #[serde(default)]
    pub search_tags: Vec<String>,
    pub emoji: Option<String>,
    pub timestamp_seconds: Option<f64>,
}

/// Raw shape the analysis model is asked to return.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryPayload {
    #[serde(default, alias = "items")]
    pub inventory: Vec<ClothingItem>,
    #[serde(default)]
    pub suggestion_starter: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

/// Response body of `POST /analyze-video`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub inventory: Vec<ClothingItem>,
    pub suggestion_starter: Option<String>,
    pub welcome_message: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl Inventory {
    pub fn from_payload(payload: InventoryPayload) -> Self {
        Self {
            inventory: payload.inventory,
            suggestion_starter: payload.suggestion_starter,
            welcome_message: payload.welcome_message,
            analyzed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Model,
}

impl From<String> for Role {
    // Anything the client did not mark as the user's own words is treated
    // as a prior model turn.
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("user") {
            Self::User
        } else {
            Self::Model
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
    #[serde(default)]
    pub inventory_context: Vec<ClothingItem>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// Response body of `POST /api/chat`.
///
/// `related_item_ids` is omitted (not `null`) when absent so the fixed
/// degradation reply keeps its exact shape.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct ModelReply {
    pub text: String,
    pub related_item_ids: Option<Vec<String>>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
