//! Task enhancement pipeline.
//!
//! Turns a short free-text task name into a structured record by prompting the
//! local language-model server and robustly recovering structured data from its
//! reply. The orchestrator is a total function: every invocation terminates in
//! either a success record or a fully formed degraded-fallback record with the
//! same shape, and nothing in here ever raises past this boundary.
//!
//! Flow: gather context from the store -> build prompt -> one completion call
//! (no retries) -> extract -> normalize -> resolve category color -> done.

pub mod extract;
pub mod normalize;
pub mod palette;
pub mod prompt;
mod types;

pub use types::{
    CategoryGuess, CategorySnapshot, EnhancedCategory, EnhancedTask, EnhancementResult,
    RecentContext, RecentTask,
};

use chrono::Utc;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::llm::CompletionClient;
use crate::store::TaskStore;
use normalize::{DEFAULT_CATEGORY_COLOR, DEFAULT_CATEGORY_NAME, UNTITLED};
use palette::ColorTracker;

/// Reasoning text attached to degraded-fallback records.
pub const FALLBACK_REASONING: &str =
    "AI enhancement failed, using intelligent fallback with creative description";

const RECENT_TASK_LIMIT: usize = 10;
const RECENT_CONTEXT_LIMIT: usize = 10;
const CONTEXT_WINDOW_HOURS: i64 = 24;
const FALLBACK_DEADLINE_DAYS: i64 = 3;

/// Orchestrates one enhancement per call against the completion endpoint and
/// the persistence store.
pub struct TaskEnhancer {
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn TaskStore>,
    /// Colors assigned during this enhancer's lifetime. Advisory de-duplication
    /// only; see `palette`.
    colors: Mutex<ColorTracker>,
}

impl TaskEnhancer {
    pub fn new(client: Arc<dyn CompletionClient>, store: Arc<dyn TaskStore>) -> Self {
        Self {
            client,
            store,
            colors: Mutex::new(ColorTracker::new()),
        }
    }

    /// Enhance a task name. Never fails: transport errors, unparseable model
    /// output, and store failures all end in a schema-valid record.
    pub async fn enhance(&self, task_name: &str) -> EnhancementResult {
        let recent_tasks = self
            .store
            .recent_tasks(RECENT_TASK_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load recent tasks, continuing without: {}", e);
                Vec::new()
            });

        let recent_context = self
            .store
            .recent_context(CONTEXT_WINDOW_HOURS, RECENT_CONTEXT_LIMIT)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load recent context, continuing without: {}", e);
                Vec::new()
            });

        let categories = self.store.category_snapshots().await.unwrap_or_else(|e| {
            warn!("Failed to load categories, continuing without: {}", e);
            Vec::new()
        });

        {
            let mut colors = self.lock_colors();
            for category in &categories {
                colors.observe(&category.color);
            }
        }

        let prompt = prompt::build_enhancement_prompt(
            task_name,
            &recent_tasks,
            &recent_context,
            &categories,
        );

        let completion = match self.client.text_completion(&prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Completion request failed: {}", e);
                return self.fallback(task_name);
            }
        };
        debug!(
            total_tokens = completion.total_tokens,
            "Completion received"
        );

        let Some(parsed) = extract::extract_json(&completion.text) else {
            warn!(
                "No JSON structure recovered from model output ({} chars)",
                completion.text.len()
            );
            return self.fallback(task_name);
        };

        let mut rng = rand::thread_rng();
        let now = Utc::now();
        let normalized = normalize::normalize(Some(parsed), task_name, now, &mut rng);

        let category = {
            let mut colors = self.lock_colors();
            palette::resolve_category(&normalized.category, &categories, &mut colors, &mut rng)
        };

        let title = if normalized.title.trim().is_empty() {
            task_name.to_string()
        } else {
            normalized.title
        };

        EnhancementResult {
            success: true,
            task: EnhancedTask {
                title,
                description: normalized.description,
                category,
                priority_score: normalized.priority_score,
                deadline: normalized.deadline,
                suggested_deadline: Some(normalize::days_to_timestamp(
                    now,
                    normalized.timeframe_days,
                )),
                confidence: normalized.confidence,
                reasoning: normalized.reasoning,
            },
        }
    }

    /// Degraded fallback: same shape as a success record, produced without any
    /// model input.
    fn fallback(&self, task_name: &str) -> EnhancementResult {
        let mut rng = rand::thread_rng();
        self.fallback_with_rng(task_name, &mut rng)
    }

    fn fallback_with_rng<R: Rng + ?Sized>(&self, task_name: &str, rng: &mut R) -> EnhancementResult {
        let trimmed = task_name.trim();
        let title = if trimmed.is_empty() {
            UNTITLED.to_string()
        } else {
            trimmed.to_string()
        };

        EnhancementResult {
            success: false,
            task: EnhancedTask {
                title,
                description: normalize::creative_description(task_name, rng),
                category: EnhancedCategory {
                    name: DEFAULT_CATEGORY_NAME.to_string(),
                    color: DEFAULT_CATEGORY_COLOR.to_string(),
                    is_new: true,
                },
                priority_score: 0.5,
                deadline: normalize::days_to_timestamp(Utc::now(), FALLBACK_DEADLINE_DAYS),
                suggested_deadline: None,
                confidence: 0.0,
                reasoning: FALLBACK_REASONING.to_string(),
            },
        }
    }

    fn lock_colors(&self) -> std::sync::MutexGuard<'_, ColorTracker> {
        // Color tracking is advisory; a poisoned lock is not worth failing over.
        self.colors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, Completion, CompletionClient, LlmError};
    use crate::store::{
        Category, ContextEntry, NewContext, NewTask, StoreError, Task, TaskFilter, TaskStore,
        TaskUpdate,
    };
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Scripted completion client.
    struct FakeClient {
        reply: Result<String, ()>,
    }

    impl FakeClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self { reply: Err(()) }
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn text_completion(&self, _prompt: &str) -> Result<Completion, LlmError> {
            match &self.reply {
                Ok(text) => Ok(Completion {
                    text: text.clone(),
                    total_tokens: 128,
                }),
                Err(()) => Err(LlmError::Timeout("deadline elapsed".to_string())),
            }
        }

        async fn chat_completion(&self, _messages: &[ChatMessage]) -> Result<Completion, LlmError> {
            self.text_completion("").await
        }
    }

    /// In-memory store exposing only what the enhancer reads.
    #[derive(Default)]
    struct FakeStore {
        categories: Vec<CategorySnapshot>,
        fail_reads: bool,
    }

    #[async_trait]
    impl TaskStore for FakeStore {
        async fn recent_tasks(&self, _limit: usize) -> Result<Vec<RecentTask>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Internal("store offline".to_string()));
            }
            Ok(Vec::new())
        }

        async fn recent_context(
            &self,
            _window_hours: i64,
            _limit: usize,
        ) -> Result<Vec<RecentContext>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Internal("store offline".to_string()));
            }
            Ok(Vec::new())
        }

        async fn category_snapshots(&self) -> Result<Vec<CategorySnapshot>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Internal("store offline".to_string()));
            }
            Ok(self.categories.clone())
        }

        async fn create_task(&self, _new: NewTask) -> Result<Task, StoreError> {
            unimplemented!("not exercised by the enhancer")
        }

        async fn list_tasks(&self, _filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
            unimplemented!("not exercised by the enhancer")
        }

        async fn get_task(&self, id: Uuid) -> Result<Task, StoreError> {
            Err(StoreError::TaskNotFound(id))
        }

        async fn update_task(&self, id: Uuid, _update: TaskUpdate) -> Result<Task, StoreError> {
            Err(StoreError::TaskNotFound(id))
        }

        async fn delete_task(&self, id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::TaskNotFound(id))
        }

        async fn complete_task(&self, id: Uuid) -> Result<Task, StoreError> {
            Err(StoreError::TaskNotFound(id))
        }

        async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
            Ok(Vec::new())
        }

        async fn add_context(&self, _new: NewContext) -> Result<ContextEntry, StoreError> {
            unimplemented!("not exercised by the enhancer")
        }

        async fn list_context(
            &self,
            _source_type: Option<&str>,
        ) -> Result<Vec<ContextEntry>, StoreError> {
            Ok(Vec::new())
        }

        async fn mark_context_processed(&self, id: Uuid) -> Result<ContextEntry, StoreError> {
            Err(StoreError::ContextNotFound(id))
        }
    }

    fn enhancer(client: FakeClient, store: FakeStore) -> TaskEnhancer {
        TaskEnhancer::new(Arc::new(client), Arc::new(store))
    }

    #[tokio::test]
    async fn test_clean_json_reply_end_to_end() {
        let reply = r##"{"title":"buy groceries","descriptions":"Get milk and eggs.","category":{"name":"personal","color":"#10B981"},"priority_score":0.4,"deadline":3,"confidence":0.9,"reasoning":"routine"}"##;
        let enhancer = enhancer(FakeClient::replying(reply), FakeStore::default());

        let result = enhancer.enhance("buy groceries").await;
        assert!(result.success);
        assert_eq!(result.task.title, "buy groceries");
        assert_eq!(result.task.description, "Get milk and eggs.");
        assert_eq!(result.task.category.name, "personal");
        assert_eq!(result.task.category.color, "#10B981");
        assert!(result.task.category.is_new);
        assert_eq!(result.task.priority_score, 0.4);
        assert_eq!(result.task.confidence, 0.9);
        let expected = normalize::days_to_timestamp(Utc::now(), 3);
        // Same second, barring a clock tick between the two calls.
        assert_eq!(result.task.deadline[..16], expected[..16]);
        assert!(result.task.suggested_deadline.is_some());
    }

    #[tokio::test]
    async fn test_prose_wrapped_json_recovered() {
        let reply = "Here is the result:\n```json\n{\"title\":\"call mom\",\"descriptions\":\"Call mom tonight.\",\"priority_score\":0.6,\"deadline\":1,\"confidence\":0.85,\"category\":{\"name\":\"personal\",\"color\":\"#10B981\"},\"reasoning\":\"family\"}\n```";
        let enhancer = enhancer(FakeClient::replying(reply), FakeStore::default());

        let result = enhancer.enhance("call mom").await;
        assert!(result.success);
        assert_eq!(result.task.title, "call mom");
        assert_eq!(result.task.description, "Call mom tonight.");
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_fallback() {
        let enhancer = enhancer(FakeClient::failing(), FakeStore::default());

        let result = enhancer.enhance("write report").await;
        assert!(!result.success);
        assert_eq!(result.task.title, "write report");
        assert_eq!(result.task.confidence, 0.0);
        assert_eq!(result.task.category.name, "general");
        assert_eq!(result.task.category.color, "#3B82F6");
        assert!(result.task.description.contains("write report"));
        assert_eq!(result.task.reasoning, FALLBACK_REASONING);
    }

    #[tokio::test]
    async fn test_non_json_reply_degrades_to_fallback() {
        let enhancer = enhancer(
            FakeClient::replying("I cannot help with that"),
            FakeStore::default(),
        );

        let result = enhancer.enhance("plan trip").await;
        assert!(!result.success);
        assert_eq!(result.task.confidence, 0.0);
        assert!(!result.task.description.is_empty());
        assert_eq!(result.task.category.name, "general");
    }

    #[tokio::test]
    async fn test_existing_category_matched_case_insensitively() {
        let reply = r##"{"title":"prep slides","descriptions":"Draft the deck.","category":{"name":"Work","color":"#EC4899"},"priority_score":0.8,"deadline":2,"confidence":0.9,"reasoning":"deadline soon"}"##;
        let store = FakeStore {
            categories: vec![CategorySnapshot {
                name: "work".to_string(),
                color: "#112233".to_string(),
                usage_frequency: 5,
            }],
            fail_reads: false,
        };
        let enhancer = enhancer(FakeClient::replying(reply), store);

        let result = enhancer.enhance("prep slides").await;
        assert!(result.success);
        assert_eq!(result.task.category.name, "work");
        assert_eq!(result.task.category.color, "#112233");
        assert!(!result.task.category.is_new);
    }

    #[tokio::test]
    async fn test_store_read_failures_do_not_fail_the_request() {
        let reply = r##"{"title":"water plants","descriptions":"Water the balcony plants.","category":"home","priority_score":0.2,"deadline":1,"confidence":0.7,"reasoning":"quick chore"}"##;
        let store = FakeStore {
            categories: Vec::new(),
            fail_reads: true,
        };
        let enhancer = enhancer(FakeClient::replying(reply), store);

        let result = enhancer.enhance("water plants").await;
        assert!(result.success);
        assert_eq!(result.task.category.name, "home");
    }

    #[tokio::test]
    async fn test_model_color_collision_gets_fresh_palette_color() {
        // Model proposes the color of an existing category for a brand-new name.
        let reply = r##"{"title":"file taxes","descriptions":"Collect forms and file.","category":{"name":"finance","color":"#112233"},"priority_score":0.9,"deadline":7,"confidence":0.95,"reasoning":"due soon"}"##;
        let store = FakeStore {
            categories: vec![CategorySnapshot {
                name: "work".to_string(),
                color: "#112233".to_string(),
                usage_frequency: 9,
            }],
            fail_reads: false,
        };
        let enhancer = enhancer(FakeClient::replying(reply), store);

        let result = enhancer.enhance("file taxes").await;
        assert!(result.success);
        assert!(result.task.category.is_new);
        assert_ne!(result.task.category.color, "#112233");
        assert!(palette::DEFAULT_PALETTE.contains(&result.task.category.color.as_str()));
    }

    #[tokio::test]
    async fn test_fallback_shape_matches_success_shape() {
        let enhancer = enhancer(FakeClient::failing(), FakeStore::default());
        let result = enhancer.enhance("anything").await;

        let value = serde_json::to_value(&result.task).unwrap();
        for key in [
            "title",
            "description",
            "category",
            "priority_score",
            "deadline",
            "confidence",
            "reasoning",
        ] {
            assert!(value.get(key).is_some(), "missing field {}", key);
        }
        assert!((0.0..=1.0).contains(&result.task.priority_score));
    }
}
