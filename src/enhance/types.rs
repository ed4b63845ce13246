//! Data types for the enhancement pipeline.

use serde::{Deserialize, Serialize};

/// Fully populated output of an enhancement run.
///
/// Every field is always present and range-valid, on the success path and the
/// fallback path alike, so downstream consumers never special-case failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTask {
    /// The task name, verbatim (or the original input when extraction fails).
    pub title: String,
    /// Non-empty plan text, 1-1000 chars.
    pub description: String,
    pub category: EnhancedCategory,
    /// Clamped to [0.0, 1.0].
    pub priority_score: f64,
    /// Absolute timestamp, `%Y-%m-%dT%H:%M:%S`.
    pub deadline: String,
    /// Absolute timestamp computed from the model's day-offset, when one was present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_deadline: Option<String>,
    /// Model's self-reported certainty, clamped to [0.0, 1.0]; 0.0 on any failure.
    pub confidence: f64,
    /// Explanation of the decision, at most 500 chars.
    pub reasoning: String,
}

/// Resolved category recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedCategory {
    /// Lowercase, non-empty.
    pub name: String,
    /// `#RRGGBB`.
    pub color: String,
    /// True when no existing category matched; the store creates the category
    /// later, when a task is actually saved against it.
    pub is_new: bool,
}

/// Outcome of one orchestrator invocation. `success = false` means the
/// degraded fallback was used; the record shape is identical either way.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementResult {
    pub success: bool,
    pub task: EnhancedTask,
}

/// The normalizer's category guess, before color resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGuess {
    pub name: String,
    /// The model-proposed color. Advisory only; the colorizer has the last word.
    pub color: String,
}

/// Snapshot of a stored task, used purely as prompt material.
#[derive(Debug, Clone)]
pub struct RecentTask {
    pub title: String,
    pub description: String,
    pub category_name: String,
    pub category_color: String,
    pub priority_score: f64,
}

/// Snapshot of a context entry from the last 24 hours.
#[derive(Debug, Clone)]
pub struct RecentContext {
    pub source_type: String,
    pub content: String,
}

/// Read-only category row, used for matching and color de-duplication only.
#[derive(Debug, Clone)]
pub struct CategorySnapshot {
    pub name: String,
    pub color: String,
    pub usage_frequency: i64,
}
