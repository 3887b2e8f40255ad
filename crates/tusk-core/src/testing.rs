//! In-memory test doubles shared across unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{Task, TaskId};
use crate::remote::{RemoteError, RemoteResult, RemoteStore};

/// In-memory [`RemoteStore`] with switchable failure and latency
/// injection, plus per-operation call counters.
#[derive(Default)]
pub struct MemoryRemote {
    tasks: Mutex<HashMap<TaskId, Task>>,
    latency: Mutex<Option<Duration>>,
    failing: AtomicBool,
    creates: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryRemote {
    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-populate a record without counting it as a client call.
    pub fn seed(&self, task: Task) {
        self.lock().insert(task.id, task);
    }

    /// Make every subsequent call fail with a 503 until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Delay every subsequent call, to widen race windows in tests.
    pub fn set_latency(&self, latency: Duration) {
        *self
            .latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(latency);
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::Acquire)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::Acquire)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::Acquire)
    }

    async fn gate(&self) -> RemoteResult<()> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::Acquire) {
            return Err(RemoteError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn get(&self, id: &TaskId) -> RemoteResult<Option<Task>> {
        self.gate().await?;
        Ok(self.task(id))
    }

    async fn create(&self, task: &Task) -> RemoteResult<()> {
        self.gate().await?;
        self.creates.fetch_add(1, Ordering::AcqRel);
        self.lock().insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> RemoteResult<()> {
        self.gate().await?;
        self.updates.fetch_add(1, Ordering::AcqRel);
        let mut tasks = self.lock();
        if !tasks.contains_key(&task.id) {
            return Err(RemoteError::Api {
                status: 404,
                message: "no such task".to_string(),
            });
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<()> {
        self.gate().await?;
        self.deletes.fetch_add(1, Ordering::AcqRel);
        self.lock().remove(id);
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Task>> {
        self.gate().await?;
        Ok(self
            .lock()
            .values()
            .filter(|task| task.owner_id == owner_id)
            .cloned()
            .collect())
    }
}
