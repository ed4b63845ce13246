//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::enhance::EnhancedTask;

/// Request to enhance a task name.
#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceTaskRequest {
    /// The raw task name as typed by the user
    pub task_name: String,
}

/// Response from the enhancement endpoint. The same shape is returned for
/// successes and for degraded fallbacks; `success` and the status code tell
/// them apart.
#[derive(Debug, Clone, Serialize)]
pub struct EnhanceTaskResponse {
    pub success: bool,
    pub message: String,
    pub data: EnhancedTask,
    /// Non-fatal output-validation findings, omitted when clean.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// Service health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Generic error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
