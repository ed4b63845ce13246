//! SQLite-backed task store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    Category, CategoryRef, ContextEntry, NewContext, NewTask, StoreError, Task, TaskFilter,
    TaskStatus, TaskStore, TaskUpdate,
};
use crate::enhance::normalize::DEFAULT_CATEGORY_COLOR;
use crate::enhance::{CategorySnapshot, RecentContext, RecentTask};

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS categories (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    color TEXT NOT NULL DEFAULT '#3B82F6',
    usage_frequency INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    deadline TEXT,
    is_ai_enhanced INTEGER NOT NULL DEFAULT 0,
    is_ai_suggested_deadline INTEGER NOT NULL DEFAULT 0,
    priority_score REAL NOT NULL DEFAULT 0.5,
    category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    completed_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_status_priority ON tasks(status, priority_score);
CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks(deadline);
CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category_id);

CREATE TABLE IF NOT EXISTS context (
    id TEXT PRIMARY KEY NOT NULL,
    content TEXT NOT NULL,
    source_type TEXT NOT NULL DEFAULT 'other',
    is_processed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_context_created ON context(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_context_processed ON context(is_processed);
"#;

/// Timestamp format for stored rows; lexicographic order equals time order.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.deadline, t.is_ai_enhanced, \
     t.is_ai_suggested_deadline, t.priority_score, t.status, t.created_at, t.updated_at, \
     t.completed_at, c.id, c.name, c.color";

pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        let path: PathBuf = db_path.to_path_buf();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, rusqlite::Error>(conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("Task join error: {}", e)))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Look up a category by name (case-insensitive), creating it on first
    /// use, and bump its usage counter. Called whenever a task is saved
    /// against a category.
    fn ensure_category(
        conn: &Connection,
        name: &str,
        color: Option<&str>,
    ) -> Result<CategoryRef, rusqlite::Error> {
        let normalized = name.trim().to_lowercase();
        let existing = conn
            .query_row(
                "SELECT id, name, color FROM categories WHERE name = ?1 COLLATE NOCASE",
                params![normalized],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let now = now_string();
        if let Some((id, name, color)) = existing {
            conn.execute(
                "UPDATE categories SET usage_frequency = usage_frequency + 1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            return Ok(CategoryRef {
                id: parse_uuid(&id)?,
                name,
                color,
            });
        }

        let id = Uuid::new_v4();
        let color = color.unwrap_or(DEFAULT_CATEGORY_COLOR).to_string();
        conn.execute(
            "INSERT INTO categories (id, name, color, usage_frequency, created_at, updated_at) \
             VALUES (?1, ?2, ?3, 1, ?4, ?4)",
            params![id.to_string(), normalized, color, now],
        )?;
        Ok(CategoryRef {
            id,
            name: normalized,
            color,
        })
    }

    fn fetch_task(conn: &Connection, id: Uuid) -> Result<Task, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks t LEFT JOIN categories c ON t.category_id = c.id WHERE t.id = ?1",
            TASK_COLUMNS
        );
        conn.query_row(&sql, params![id.to_string()], task_from_row)
            .optional()?
            .ok_or(StoreError::TaskNotFound(id))
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn recent_tasks(&self, limit: usize) -> Result<Vec<RecentTask>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT t.title, COALESCE(t.description, ''), \
                    COALESCE(c.name, 'general'), COALESCE(c.color, ?1), t.priority_score \
             FROM tasks t LEFT JOIN categories c ON t.category_id = c.id \
             ORDER BY t.created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![DEFAULT_CATEGORY_COLOR, limit as i64], |row| {
            Ok(RecentTask {
                title: row.get(0)?,
                description: row.get(1)?,
                category_name: row.get(2)?,
                category_color: row.get(3)?,
                priority_score: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn recent_context(
        &self,
        window_hours: i64,
        limit: usize,
    ) -> Result<Vec<RecentContext>, StoreError> {
        let cutoff = (Utc::now() - Duration::hours(window_hours))
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT source_type, content FROM context \
             WHERE created_at >= ?1 ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![cutoff, limit as i64], |row| {
            Ok(RecentContext {
                source_type: row.get(0)?,
                content: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn category_snapshots(&self) -> Result<Vec<CategorySnapshot>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT name, color, usage_frequency FROM categories \
             ORDER BY usage_frequency DESC, name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategorySnapshot {
                name: row.get(0)?,
                color: row.get(1)?,
                usage_frequency: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let conn = self.conn.lock().await;
        let category = match &new.category_name {
            Some(name) if !name.trim().is_empty() => Some(Self::ensure_category(
                &conn,
                name,
                new.category_color.as_deref(),
            )?),
            _ => None,
        };

        let id = Uuid::new_v4();
        let now = now_string();
        let priority = new.priority_score.unwrap_or(0.5).clamp(0.0, 1.0);
        conn.execute(
            "INSERT INTO tasks (id, title, description, deadline, is_ai_enhanced, \
             is_ai_suggested_deadline, priority_score, category_id, status, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?9)",
            params![
                id.to_string(),
                new.title,
                new.description,
                new.deadline,
                new.is_ai_enhanced,
                new.is_ai_suggested_deadline,
                priority,
                category.as_ref().map(|c| c.id.to_string()),
                now,
            ],
        )?;

        Self::fetch_task(&conn, id)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<rusqlite::types::Value> = Vec::new();

        if let Some(status) = filter.status {
            values.push(status.as_str().to_string().into());
            clauses.push(format!("t.status = ?{}", values.len()));
        }
        if let Some(category) = filter.category {
            values.push(category.to_string().into());
            clauses.push(format!("t.category_id = ?{}", values.len()));
        }
        if let Some(min) = filter.min_priority {
            values.push(min.into());
            clauses.push(format!("t.priority_score >= ?{}", values.len()));
        }
        if let Some(max) = filter.max_priority {
            values.push(max.into());
            clauses.push(format!("t.priority_score <= ?{}", values.len()));
        }
        if let Some(has_deadline) = filter.has_deadline {
            clauses.push(if has_deadline {
                "t.deadline IS NOT NULL".to_string()
            } else {
                "t.deadline IS NULL".to_string()
            });
        }
        if filter.overdue == Some(true) {
            values.push(now_string().into());
            clauses.push(format!(
                "t.deadline IS NOT NULL AND t.deadline < ?{} AND t.status IN ('pending', 'in_progress')",
                values.len()
            ));
        }
        if let Some(search) = &filter.search {
            values.push(format!("%{}%", search).into());
            let n = values.len();
            clauses.push(format!(
                "(t.title LIKE ?{n} OR t.description LIKE ?{n})",
                n = n
            ));
        }

        let mut sql = format!(
            "SELECT {} FROM tasks t LEFT JOIN categories c ON t.category_id = c.id",
            TASK_COLUMNS
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY t.priority_score DESC, t.created_at DESC");

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), task_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_task(&self, id: Uuid) -> Result<Task, StoreError> {
        let conn = self.conn.lock().await;
        Self::fetch_task(&conn, id)
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Task, StoreError> {
        let conn = self.conn.lock().await;
        // Ensure the row exists before touching anything.
        Self::fetch_task(&conn, id)?;

        if let Some(title) = &update.title {
            conn.execute(
                "UPDATE tasks SET title = ?1 WHERE id = ?2",
                params![title, id.to_string()],
            )?;
        }
        if let Some(description) = &update.description {
            conn.execute(
                "UPDATE tasks SET description = ?1 WHERE id = ?2",
                params![description, id.to_string()],
            )?;
        }
        if let Some(deadline) = &update.deadline {
            conn.execute(
                "UPDATE tasks SET deadline = ?1 WHERE id = ?2",
                params![deadline, id.to_string()],
            )?;
        }
        if let Some(priority) = update.priority_score {
            conn.execute(
                "UPDATE tasks SET priority_score = ?1 WHERE id = ?2",
                params![priority.clamp(0.0, 1.0), id.to_string()],
            )?;
        }
        if let Some(status) = update.status {
            let completed_at = if status == TaskStatus::Completed {
                Some(now_string())
            } else {
                None
            };
            conn.execute(
                "UPDATE tasks SET status = ?1, completed_at = ?2 WHERE id = ?3",
                params![status.as_str(), completed_at, id.to_string()],
            )?;
        }
        if let Some(name) = &update.category_name {
            let category =
                Self::ensure_category(&conn, name, update.category_color.as_deref())?;
            conn.execute(
                "UPDATE tasks SET category_id = ?1 WHERE id = ?2",
                params![category.id.to_string(), id.to_string()],
            )?;
        }
        conn.execute(
            "UPDATE tasks SET updated_at = ?1 WHERE id = ?2",
            params![now_string(), id.to_string()],
        )?;

        Self::fetch_task(&conn, id)
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        if affected == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        Ok(())
    }

    async fn complete_task(&self, id: Uuid) -> Result<Task, StoreError> {
        let conn = self.conn.lock().await;
        let now = now_string();
        let affected = conn.execute(
            "UPDATE tasks SET status = 'completed', completed_at = ?1, updated_at = ?1 WHERE id = ?2",
            params![now, id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        Self::fetch_task(&conn, id)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, name, color, usage_frequency, created_at FROM categories \
             ORDER BY usage_frequency DESC, name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: parse_uuid(&row.get::<_, String>(0)?)?,
                name: row.get(1)?,
                color: row.get(2)?,
                usage_frequency: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn add_context(&self, new: NewContext) -> Result<ContextEntry, StoreError> {
        let conn = self.conn.lock().await;
        let id = Uuid::new_v4();
        let now = now_string();
        let source_type = new.source_type.unwrap_or_else(|| "other".to_string());
        conn.execute(
            "INSERT INTO context (id, content, source_type, is_processed, created_at) \
             VALUES (?1, ?2, ?3, 0, ?4)",
            params![id.to_string(), new.content, source_type, now],
        )?;
        Ok(ContextEntry {
            id,
            content: new.content,
            source_type,
            is_processed: false,
            created_at: now,
        })
    }

    async fn list_context(
        &self,
        source_type: Option<&str>,
    ) -> Result<Vec<ContextEntry>, StoreError> {
        let conn = self.conn.lock().await;
        let (sql, filter_value) = match source_type {
            Some(source) => (
                "SELECT id, content, source_type, is_processed, created_at FROM context \
                 WHERE source_type = ?1 ORDER BY created_at DESC",
                Some(source.to_string()),
            ),
            None => (
                "SELECT id, content, source_type, is_processed, created_at FROM context \
                 ORDER BY created_at DESC",
                None,
            ),
        };
        let mut stmt = conn.prepare(sql)?;
        let map_row = |row: &Row<'_>| {
            Ok(ContextEntry {
                id: parse_uuid(&row.get::<_, String>(0)?)?,
                content: row.get(1)?,
                source_type: row.get(2)?,
                is_processed: row.get(3)?,
                created_at: row.get(4)?,
            })
        };
        let rows = match filter_value {
            Some(value) => stmt.query_map(params![value], map_row)?,
            None => stmt.query_map([], map_row)?,
        };
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn mark_context_processed(&self, id: Uuid) -> Result<ContextEntry, StoreError> {
        let conn = self.conn.lock().await;
        let affected = conn.execute(
            "UPDATE context SET is_processed = 1 WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::ContextNotFound(id));
        }
        conn.query_row(
            "SELECT id, content, source_type, is_processed, created_at FROM context WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok(ContextEntry {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    content: row.get(1)?,
                    source_type: row.get(2)?,
                    is_processed: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )
        .map_err(StoreError::from)
    }
}

fn now_string() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_uuid(raw: &str) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let category = match row.get::<_, Option<String>>(11)? {
        Some(id) => Some(CategoryRef {
            id: parse_uuid(&id)?,
            name: row.get(12)?,
            color: row.get(13)?,
        }),
        None => None,
    };
    Ok(Task {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        description: row.get(2)?,
        deadline: row.get(3)?,
        is_ai_enhanced: row.get(4)?,
        is_ai_suggested_deadline: row.get(5)?,
        priority_score: row.get(6)?,
        status: TaskStatus::parse(&row.get::<_, String>(7)?).unwrap_or(TaskStatus::Pending),
        category,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        completed_at: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(title: &str, category: Option<&str>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: Some(format!("{} description", title)),
            deadline: None,
            priority_score: Some(0.5),
            category_name: category.map(str::to_string),
            category_color: None,
            is_ai_enhanced: false,
            is_ai_suggested_deadline: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_roundtrip() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let created = store.create_task(new_task("buy milk", Some("errands"))).await.unwrap();

        let fetched = store.get_task(created.id).await.unwrap();
        assert_eq!(fetched.title, "buy milk");
        assert_eq!(fetched.status, TaskStatus::Pending);
        assert_eq!(fetched.category.unwrap().name, "errands");
    }

    #[tokio::test]
    async fn test_category_usage_incremented_on_save() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        store.create_task(new_task("a", Some("work"))).await.unwrap();
        store.create_task(new_task("b", Some("Work"))).await.unwrap();

        let categories = store.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1, "case-insensitive name must not fork the category");
        assert_eq!(categories[0].usage_frequency, 2);
    }

    #[tokio::test]
    async fn test_snapshots_ordered_by_usage_then_name() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        store.create_task(new_task("a", Some("beta"))).await.unwrap();
        store.create_task(new_task("b", Some("alpha"))).await.unwrap();
        store.create_task(new_task("c", Some("beta"))).await.unwrap();

        let snapshots = store.category_snapshots().await.unwrap();
        assert_eq!(snapshots[0].name, "beta");
        assert_eq!(snapshots[0].usage_frequency, 2);
        assert_eq!(snapshots[1].name, "alpha");
    }

    #[tokio::test]
    async fn test_recent_tasks_joined_with_category_color() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let mut task = new_task("paint fence", Some("home"));
        task.category_color = Some("#84CC16".to_string());
        store.create_task(task).await.unwrap();
        store.create_task(new_task("loose task", None)).await.unwrap();

        let recent = store.recent_tasks(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        let painted = recent.iter().find(|t| t.title == "paint fence").unwrap();
        assert_eq!(painted.category_color, "#84CC16");
        let loose = recent.iter().find(|t| t.title == "loose task").unwrap();
        assert_eq!(loose.category_name, "general");
    }

    #[tokio::test]
    async fn test_recent_context_window_excludes_old_entries() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        store
            .add_context(NewContext {
                content: "meeting moved to friday".to_string(),
                source_type: Some("email".to_string()),
            })
            .await
            .unwrap();

        // Backdate a second entry past the 24-hour window.
        {
            let conn = store.conn.lock().await;
            let old = (Utc::now() - Duration::hours(30))
                .format(TIMESTAMP_FORMAT)
                .to_string();
            conn.execute(
                "INSERT INTO context (id, content, source_type, is_processed, created_at) \
                 VALUES (?1, 'stale', 'note', 0, ?2)",
                params![Uuid::new_v4().to_string(), old],
            )
            .unwrap();
        }

        let recent = store.recent_context(24, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].source_type, "email");
    }

    #[tokio::test]
    async fn test_filters() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let mut urgent = new_task("submit taxes", Some("finance"));
        urgent.priority_score = Some(0.9);
        store.create_task(urgent).await.unwrap();
        store.create_task(new_task("tidy desk", None)).await.unwrap();

        let high = store
            .list_tasks(&TaskFilter {
                min_priority: Some(0.7),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].title, "submit taxes");

        let searched = store
            .list_tasks(&TaskFilter {
                search: Some("desk".to_string()),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].title, "tidy desk");
    }

    #[tokio::test]
    async fn test_overdue_filter() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let mut late = new_task("late report", None);
        late.deadline = Some(
            (Utc::now() - Duration::days(1))
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        );
        store.create_task(late).await.unwrap();
        let mut future = new_task("future report", None);
        future.deadline = Some(
            (Utc::now() + Duration::days(5))
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        );
        store.create_task(future).await.unwrap();

        let overdue = store
            .list_tasks(&TaskFilter {
                overdue: Some(true),
                ..TaskFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "late report");
    }

    #[tokio::test]
    async fn test_update_and_complete() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let task = store.create_task(new_task("draft post", None)).await.unwrap();

        let updated = store
            .update_task(
                task.id,
                TaskUpdate {
                    priority_score: Some(2.0),
                    category_name: Some("writing".to_string()),
                    ..TaskUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.priority_score, 1.0, "priority clamped on write");
        assert_eq!(updated.category.unwrap().name, "writing");

        let completed = store.complete_task(task.id).await.unwrap();
        assert_eq!(completed.status, TaskStatus::Completed);
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_task_errors() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.get_task(id).await,
            Err(StoreError::TaskNotFound(_))
        ));
        assert!(matches!(
            store.delete_task(id).await,
            Err(StoreError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let id = {
            let store = SqliteTaskStore::new(&path).await.unwrap();
            store
                .create_task(new_task("persisted", Some("work")))
                .await
                .unwrap()
                .id
        };

        let store = SqliteTaskStore::new(&path).await.unwrap();
        let task = store.get_task(id).await.unwrap();
        assert_eq!(task.title, "persisted");
    }

    #[tokio::test]
    async fn test_mark_context_processed() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let entry = store
            .add_context(NewContext {
                content: "call the dentist".to_string(),
                source_type: None,
            })
            .await
            .unwrap();
        assert!(!entry.is_processed);

        let marked = store.mark_context_processed(entry.id).await.unwrap();
        assert!(marked.is_processed);
        assert_eq!(marked.source_type, "other");
    }
}
