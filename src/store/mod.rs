//! Persistence for tasks, categories, and context entries.
//!
//! The enhancement pipeline only reads from here (recent tasks, 24-hour
//! context, category snapshots); everything else is the plain CRUD surface the
//! REST layer exposes. Reads are synchronous snapshots with no transactional
//! requirement.

mod sqlite;

pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::enhance::{CategorySnapshot, RecentContext, RecentTask};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Context entry not found: {0}")]
    ContextNotFound(Uuid),

    #[error("{0}")]
    Internal(String),
}

/// Task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

/// A stored task, category joined.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub is_ai_enhanced: bool,
    pub is_ai_suggested_deadline: bool,
    pub priority_score: f64,
    pub category: Option<CategoryRef>,
    pub status: TaskStatus,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Category as embedded in a task.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

/// A stored category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub usage_frequency: i64,
    pub created_at: String,
}

/// Payload for creating a task. When a category name is given the store
/// resolves or creates it and bumps its usage counter.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority_score: Option<f64>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(default)]
    pub is_ai_enhanced: bool,
    #[serde(default)]
    pub is_ai_suggested_deadline: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub priority_score: Option<f64>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
}

/// Listing filters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub min_priority: Option<f64>,
    #[serde(default)]
    pub max_priority: Option<f64>,
    #[serde(default)]
    pub has_deadline: Option<bool>,
    #[serde(default)]
    pub overdue: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

/// A stored context entry.
#[derive(Debug, Clone, Serialize)]
pub struct ContextEntry {
    pub id: Uuid,
    pub content: String,
    pub source_type: String,
    pub is_processed: bool,
    pub created_at: String,
}

/// Payload for capturing context.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContext {
    pub content: String,
    #[serde(default)]
    pub source_type: Option<String>,
}

/// Store operations. The first three are what the enhancement core consumes.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Most recent tasks with their category name and color joined.
    async fn recent_tasks(&self, limit: usize) -> Result<Vec<RecentTask>, StoreError>;

    /// Context entries created within the last `window_hours`.
    async fn recent_context(
        &self,
        window_hours: i64,
        limit: usize,
    ) -> Result<Vec<RecentContext>, StoreError>;

    /// All categories ordered by usage frequency descending, then name.
    async fn category_snapshots(&self) -> Result<Vec<CategorySnapshot>, StoreError>;

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError>;
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;
    async fn get_task(&self, id: Uuid) -> Result<Task, StoreError>;
    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Task, StoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), StoreError>;
    async fn complete_task(&self, id: Uuid) -> Result<Task, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn add_context(&self, new: NewContext) -> Result<ContextEntry, StoreError>;
    async fn list_context(
        &self,
        source_type: Option<&str>,
    ) -> Result<Vec<ContextEntry>, StoreError>;
    async fn mark_context_processed(&self, id: Uuid) -> Result<ContextEntry, StoreError>;
}
