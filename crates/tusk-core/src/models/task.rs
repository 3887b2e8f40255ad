//! Task model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::now_millis;

/// A unique identifier for a task, using UUID v7 (time-sortable)
///
/// Generated client-side at creation time so a task keeps the same primary
/// key in the local and remote stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Fields supplied by the user when creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    /// Short task title
    pub title: String,
    /// Longer free-form description
    pub description: String,
    /// Optional reminder timestamp (Unix ms)
    pub reminder_at: Option<i64>,
}

/// A task record, the unit of synchronization
///
/// `synced` is true only once the sync engine has confirmed the remote
/// store holds this id with content matching the last local write. Every
/// local mutation clears it before the mutation is considered complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable for the task's lifetime
    pub id: TaskId,
    /// Owning user; all queries are scoped by it
    pub owner_id: String,
    /// Short task title
    pub title: String,
    /// Longer free-form description
    pub description: String,
    /// Completion flag
    pub completed: bool,
    /// Optional reminder timestamp (Unix ms)
    pub reminder_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last local mutation timestamp (Unix ms)
    pub updated_at: i64,
    /// Whether the remote store has confirmed the current content
    pub synced: bool,
}

impl Task {
    /// Build a fresh, not-yet-synced task for the given owner
    #[must_use]
    pub fn new(owner_id: impl Into<String>, draft: NewTask) -> Self {
        let now = now_millis();
        Self {
            id: TaskId::new(),
            owner_id: owner_id.into(),
            title: draft.title,
            description: draft.description,
            completed: false,
            reminder_at: draft.reminder_at,
            created_at: now,
            updated_at: now,
            synced: false,
        }
    }

    /// Merge a patch into this task, refreshing `updated_at` and clearing
    /// the synced flag
    pub fn apply(&mut self, patch: &TaskPatch, now: i64) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(reminder_at) = patch.reminder_at {
            self.reminder_at = reminder_at;
        }
        self.updated_at = now;
        self.synced = false;
    }

}

/// Partial update applied to an existing task
///
/// `reminder_at` is doubly optional so a reminder can be cleared
/// (`Some(None)`) as well as left untouched (`None`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub reminder_at: Option<Option<i64>>,
}

impl TaskPatch {
    /// Patch that only sets the completion flag
    #[must_use]
    pub const fn completion(completed: bool) -> Self {
        Self {
            title: None,
            description: None,
            completed: Some(completed),
            reminder_at: None,
        }
    }

    /// True when the patch changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.reminder_at.is_none()
    }
}
