// API request/response models (DTOs)

use serde::{Deserialize, Serialize};

/// Body of `POST /api/games` and `PUT /api/games/{id}`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub publisher_id: Option<String>,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub store_id: Option<String>,
    pub bundle_id: Option<String>,
    pub app_version: Option<String>,
    pub is_published: Option<bool>,
}

/// Body of `POST /api/games/search`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub name: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: i64,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
