use serde::{Deserialize, Serialize};
use crate::models::domain::{CategoryCounts, Event};

/// Response for every event listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<Event>,
    pub total: usize,
}

impl From<Vec<Event>> for EventListResponse {
    fn from(events: Vec<Event>) -> Self {
        let total = events.len();
        Self { events, total }
    }
}

/// Response for the category counts endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCountsResponse {
    pub counts: CategoryCounts,
    /// Sum of all counts
    pub total: usize,
}

impl From<CategoryCounts> for CategoryCountsResponse {
    fn from(counts: CategoryCounts) -> Self {
        let total = counts.values().sum();
        Self { counts, total }
    }
}

/// Result of validating an event draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(default)]
    pub retryable: bool,
}
