//! Shared task store handle used across the engine and dispatcher.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlTaskRepository, TaskRepository};
use crate::models::{Task, TaskId, TaskPatch};
use crate::Result;

/// Thread-safe handle over the local task database.
///
/// Clones share one connection; callers never touch the repository or the
/// connection directly.
#[derive(Clone)]
pub struct TaskStore {
    db: Arc<Mutex<Database>>,
}

impl TaskStore {
    /// Open a task store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory task store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Insert a task exactly as given.
    pub async fn create_task(&self, task: &Task) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.create(task).await
    }

    /// Fetch a task by id.
    pub async fn get_task(&self, id: &TaskId) -> Result<Option<Task>> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.get(id).await
    }

    /// List an owner's tasks, newest first.
    pub async fn list_tasks(&self, owner_id: &str) -> Result<Vec<Task>> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.get_all(owner_id).await
    }

    /// List an owner's tasks that still await remote confirmation.
    pub async fn unsynced_tasks(&self, owner_id: &str) -> Result<Vec<Task>> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.get_unsynced(owner_id).await
    }

    /// Merge a patch into a task.
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.update(id, patch).await
    }

    /// Flag a task as confirmed by the remote store.
    pub async fn mark_synced(&self, id: &TaskId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.mark_synced(id).await
    }

    /// Remove a task; returns false when it was already absent.
    pub async fn delete_task(&self, id: &TaskId) -> Result<bool> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.delete(id).await
    }

    /// Overwrite a task's content with an authoritative copy.
    pub async fn replace_task(&self, task: &Task) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTaskRepository::new(db.connection());
        repo.replace(task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewTask;

    #[tokio::test(flavor = "multi_thread")]
    async fn in_memory_create_and_list_roundtrip() {
        let store = TaskStore::open_in_memory().await.unwrap();

        let task = Task::new(
            "user-1",
            NewTask {
                title: "hello core".to_string(),
                ..NewTask::default()
            },
        );
        store.create_task(&task).await.unwrap();

        let tasks = store.list_tasks("user-1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "hello core");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_share_the_same_database() {
        let store = TaskStore::open_in_memory().await.unwrap();
        let clone = store.clone();

        let task = Task::new(
            "user-1",
            NewTask {
                title: "shared".to_string(),
                ..NewTask::default()
            },
        );
        store.create_task(&task).await.unwrap();

        assert!(clone.get_task(&task.id).await.unwrap().is_some());
    }
}
