//! HTTP API for TodoGenius.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `POST /api/ai/enhance-task` - Enhance a task name into a structured record
//! - `GET /api/ai/health` - LM Studio reachability and loaded models
//! - `GET /api/tasks` - List tasks (filterable)
//! - `POST /api/tasks` - Create a task
//! - `GET /api/tasks/overdue` - Tasks past their deadline and still open
//! - `GET /api/tasks/high-priority` - Tasks with priority >= 0.7
//! - `GET /api/tasks/{id}` - Fetch a task
//! - `PATCH /api/tasks/{id}` - Partially update a task
//! - `DELETE /api/tasks/{id}` - Delete a task
//! - `POST /api/tasks/{id}/complete` - Mark a task completed
//! - `GET /api/categories` - List categories by usage
//! - `GET /api/context` - List context entries
//! - `POST /api/context` - Capture a context entry
//! - `POST /api/context/{id}/mark-processed` - Mark a context entry processed

mod routes;
pub mod types;

pub use routes::serve;
pub use types::*;
