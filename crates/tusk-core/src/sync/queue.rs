//! Retry queue for propagation work that failed and awaits another attempt.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::models::TaskId;

/// Action to replay against the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryAction {
    /// Push the task's current local state (degrades to an update when the
    /// remote already has the id)
    CreateOrUpdate,
    /// Remove the task from the remote store
    Delete,
}

/// A pending propagation. Holds only the task id, never the task itself:
/// the record may already be gone locally by the time the entry is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryEntry {
    pub task_id: TaskId,
    pub action: RetryAction,
}

/// In-process queue of failed propagation attempts.
///
/// Holds at most one entry per task id: enqueueing for an already-queued
/// id replaces the old entry, so the most recent intent wins and nothing
/// is ever attempted twice concurrently.
#[derive(Debug, Default)]
pub struct RetryQueue {
    entries: Mutex<Vec<RetryEntry>>,
}

impl RetryQueue {
    fn lock(&self) -> MutexGuard<'_, Vec<RetryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an entry, replacing any existing entry for the same task id.
    pub fn enqueue(&self, task_id: TaskId, action: RetryAction) {
        let mut entries = self.lock();
        entries.retain(|entry| entry.task_id != task_id);
        entries.push(RetryEntry { task_id, action });
    }

    /// Atomically take every queued entry, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<RetryEntry> {
        std::mem::take(&mut *self.lock())
    }

    /// Snapshot of the queued entries.
    pub fn entries(&self) -> Vec<RetryEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
