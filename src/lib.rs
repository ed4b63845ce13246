//! TodoGenius - AI-assisted task enhancement service.
//!
//! Turns a short free-text task name into a structured task record (detailed
//! description, category with a stable color, priority score, deadline,
//! confidence, reasoning) by prompting a local LM Studio model and robustly
//! recovering JSON from whatever the model replies. Tasks, categories, and
//! captured context live in SQLite; a small REST API fronts the whole thing.

pub mod api;
pub mod config;
pub mod enhance;
pub mod llm;
pub mod store;

pub use config::Config;
pub use enhance::{EnhancedTask, EnhancementResult, TaskEnhancer};
pub use store::{SqliteTaskStore, TaskStore};
