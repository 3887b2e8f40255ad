//! Local-first mutation dispatch.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::db::TaskStore;
use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::sync::SyncEngine;

/// Application-facing entry point for task mutations.
///
/// Every mutation is applied to the local store first and returns as soon
/// as that write lands; remote propagation runs on a spawned task the
/// caller never waits for. The only failures surfaced here are local
/// store failures, which mean the user's intent was not durably recorded.
#[derive(Clone)]
pub struct TaskMutator {
    store: TaskStore,
    engine: SyncEngine,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl TaskMutator {
    pub fn new(store: TaskStore, engine: SyncEngine) -> Self {
        Self {
            store,
            engine,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a task. Visible to local reads before this returns; remote
    /// visibility is eventual.
    pub async fn create(&self, owner_id: &str, draft: NewTask) -> Result<Task> {
        let task = Task::new(owner_id, draft);
        self.store.create_task(&task).await?;
        self.spawn_push(task.clone());
        Ok(task)
    }

    /// Merge a patch into an existing task and schedule propagation.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        let task = self.store.update_task(id, &patch).await?;
        self.spawn_push(task.clone());
        Ok(task)
    }

    /// Flip a task's completion flag.
    pub async fn toggle_completed(&self, id: &TaskId) -> Result<Task> {
        let current = self
            .store
            .get_task(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.update(id, TaskPatch::completion(!current.completed))
            .await
    }

    /// Delete a task locally and schedule the remote deletion.
    ///
    /// The local removal is authoritative: it happens immediately whatever
    /// the remote's fate. A missing id is a no-op, not an error.
    pub async fn delete(&self, id: &TaskId) -> Result<()> {
        if self.store.delete_task(id).await? {
            self.spawn_deletion(*id);
        }
        Ok(())
    }

    /// Await every outstanding propagation task.
    ///
    /// Tests (and one-shot processes about to exit) call this to make the
    /// fire-and-forget work deterministic; interactive callers never need
    /// to.
    pub async fn flush(&self) {
        loop {
            let handles: Vec<_> = {
                let mut pending = self
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                pending.drain(..).collect()
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    fn spawn_push(&self, task: Task) {
        let engine = self.engine.clone();
        self.track(tokio::spawn(async move {
            engine.propagate_task(&task).await;
        }));
    }

    fn spawn_deletion(&self, id: TaskId) {
        let engine = self.engine.clone();
        self.track(tokio::spawn(async move {
            engine.propagate_deletion(id).await;
        }));
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }
}
