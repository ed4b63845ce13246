//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::enhance::{EnhancedTask, TaskEnhancer};
use crate::llm::{CompletionClient, LmStudioClient};
use crate::store::{
    NewContext, NewTask, SqliteTaskStore, StoreError, TaskFilter, TaskStore, TaskUpdate,
};

use super::types::*;

const MAX_TASK_NAME_CHARS: usize = 255;
const HIGH_PRIORITY_THRESHOLD: f64 = 0.7;

/// Shared application state.
pub struct AppState {
    pub store: Arc<dyn TaskStore>,
    pub enhancer: TaskEnhancer,
    pub llm: Arc<LmStudioClient>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::new(&config.database_path).await?);
    let llm = Arc::new(LmStudioClient::new(&config));
    let client: Arc<dyn CompletionClient> = Arc::clone(&llm) as Arc<dyn CompletionClient>;

    let state = Arc::new(AppState {
        enhancer: TaskEnhancer::new(client, Arc::clone(&store)),
        store,
        llm,
    });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("TodoGenius API listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/ai/enhance-task", post(enhance_task))
        .route("/api/ai/health", get(ai_health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/overdue", get(overdue_tasks))
        .route("/api/tasks/high-priority", get(high_priority_tasks))
        .route(
            "/api/tasks/:id",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/:id/complete", post(complete_task))
        .route("/api/categories", get(list_categories))
        .route("/api/context", get(list_context).post(add_context))
        .route("/api/context/:id/mark-processed", post(mark_context_processed))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Store errors mapped to HTTP responses. Not-found variants become 404,
/// everything else is an opaque 500 (details go to the log, not the client).
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StoreError::TaskNotFound(_) | StoreError::ContextNotFound(_) => {
                (StatusCode::NOT_FOUND, self.0.to_string())
            }
            other => {
                tracing::error!("Store error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "todogenius",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn ai_health(State(state): State<Arc<AppState>>) -> Response {
    let report = state.llm.check_health().await;
    let status = if report.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

async fn enhance_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnhanceTaskRequest>,
) -> Response {
    let task_name = request.task_name.trim();
    if task_name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "task_name must not be empty".to_string(),
            }),
        )
            .into_response();
    }
    if task_name.chars().count() > MAX_TASK_NAME_CHARS {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("task_name must be at most {} characters", MAX_TASK_NAME_CHARS),
            }),
        )
            .into_response();
    }

    let result = state.enhancer.enhance(task_name).await;
    let warnings = validate_enhancement(&result.task);
    let warnings = if warnings.is_empty() {
        None
    } else {
        Some(warnings)
    };

    // A fallback record is still a usable payload; the 500 signals that the
    // model did not contribute to it.
    let (status, message) = if result.success {
        (StatusCode::OK, "Task enhanced successfully")
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI enhancement failed, returning fallback data",
        )
    };

    (
        status,
        Json(EnhanceTaskResponse {
            success: result.success,
            message: message.to_string(),
            data: result.task,
            warnings,
        }),
    )
        .into_response()
}

/// Sanity-check an enhancement record before handing it to the client.
fn validate_enhancement(task: &EnhancedTask) -> Vec<String> {
    let mut warnings = Vec::new();
    let color = &task.category.color;
    let valid_color = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid_color {
        warnings.push(format!("category color is not #RRGGBB: {}", color));
    }
    if !(0.0..=1.0).contains(&task.priority_score) {
        warnings.push(format!("priority_score out of range: {}", task.priority_score));
    }
    if !(0.0..=1.0).contains(&task.confidence) {
        warnings.push(format!("confidence out of range: {}", task.confidence));
    }
    if task.description.trim().is_empty() {
        warnings.push("description is empty".to_string());
    }
    warnings
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Response> {
    let tasks = state.store.list_tasks(&filter).await?;
    Ok(Json(tasks).into_response())
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewTask>,
) -> ApiResult<Response> {
    if new.title.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "title must not be empty".to_string(),
            }),
        )
            .into_response());
    }
    let task = state.store.create_task(new).await?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

async fn overdue_tasks(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let filter = TaskFilter {
        overdue: Some(true),
        ..TaskFilter::default()
    };
    let tasks = state.store.list_tasks(&filter).await?;
    Ok(Json(tasks).into_response())
}

async fn high_priority_tasks(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let filter = TaskFilter {
        min_priority: Some(HIGH_PRIORITY_THRESHOLD),
        ..TaskFilter::default()
    };
    let tasks = state.store.list_tasks(&filter).await?;
    Ok(Json(tasks).into_response())
}

async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let task = state.store.get_task(id).await?;
    Ok(Json(task).into_response())
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Response> {
    let task = state.store.update_task(id, update).await?;
    Ok(Json(task).into_response())
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state.store.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn complete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let task = state.store.complete_task(id).await?;
    Ok(Json(task).into_response())
}

async fn list_categories(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories).into_response())
}

#[derive(Debug, serde::Deserialize)]
struct ContextQuery {
    source_type: Option<String>,
}

async fn list_context(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContextQuery>,
) -> ApiResult<Response> {
    let entries = state.store.list_context(query.source_type.as_deref()).await?;
    Ok(Json(entries).into_response())
}

async fn add_context(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewContext>,
) -> ApiResult<Response> {
    if new.content.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "content must not be empty".to_string(),
            }),
        )
            .into_response());
    }
    let entry = state.store.add_context(new).await?;
    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

async fn mark_context_processed(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let entry = state.store.mark_context_processed(id).await?;
    Ok(Json(entry).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::EnhancedCategory;

    fn record(color: &str, priority: f64) -> EnhancedTask {
        EnhancedTask {
            title: "t".to_string(),
            description: "d".to_string(),
            category: EnhancedCategory {
                name: "general".to_string(),
                color: color.to_string(),
                is_new: true,
            },
            priority_score: priority,
            deadline: "2026-09-01T12:00:00".to_string(),
            suggested_deadline: None,
            confidence: 0.8,
            reasoning: "r".to_string(),
        }
    }

    #[test]
    fn test_validate_clean_record_has_no_warnings() {
        assert!(validate_enhancement(&record("#3B82F6", 0.5)).is_empty());
    }

    #[test]
    fn test_validate_flags_bad_color_and_range() {
        let warnings = validate_enhancement(&record("blue", 1.5));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("category color"));
        assert!(warnings[1].contains("priority_score"));
    }
}
