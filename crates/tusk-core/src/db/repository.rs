//! Task repository implementation

use async_trait::async_trait;
use libsql::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{Task, TaskId, TaskPatch};
use crate::util::now_millis;

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, completed, reminder_at, created_at, updated_at, synced";

/// Trait for task storage operations
#[async_trait]
pub trait TaskRepository {
    /// Insert a task exactly as given (including its synced flag)
    async fn create(&self, task: &Task) -> Result<()>;

    /// Get a task by ID
    async fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// List all tasks for an owner, newest first
    async fn get_all(&self, owner_id: &str) -> Result<Vec<Task>>;

    /// List tasks for an owner that still await remote confirmation
    async fn get_unsynced(&self, owner_id: &str) -> Result<Vec<Task>>;

    /// Merge a patch into a task, refreshing `updated_at` and clearing
    /// `synced`; returns the merged task
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task>;

    /// Flag a task as confirmed by the remote store
    ///
    /// A missing row is not an error: the task may have been deleted
    /// locally while its propagation was in flight.
    async fn mark_synced(&self, id: &TaskId) -> Result<()>;

    /// Remove a task; returns false when the row was already absent
    async fn delete(&self, id: &TaskId) -> Result<bool>;

    /// Overwrite a task's content with an authoritative copy (used when
    /// importing remote state); `Error::NotFound` when the row is absent
    async fn replace(&self, task: &Task) -> Result<()>;
}

/// libSQL implementation of `TaskRepository`
pub struct LibSqlTaskRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTaskRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_task(row: &libsql::Row) -> Result<Task> {
        let id: String = row.get(0)?;
        let id = id
            .parse()
            .map_err(|_| Error::Database(format!("invalid task id in row: {id}")))?;
        Ok(Task {
            id,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            completed: row.get::<i32>(4)? != 0,
            reminder_at: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
            synced: row.get::<i32>(8)? != 0,
        })
    }

    async fn collect_tasks(&self, sql: &str, owner_id: &str) -> Result<Vec<Task>> {
        let mut rows = self.conn.query(sql, params![owner_id]).await?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().await? {
            tasks.push(Self::parse_task(&row)?);
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskRepository for LibSqlTaskRepository<'_> {
    async fn create(&self, task: &Task) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO tasks (id, owner_id, title, description, completed, reminder_at,
                                    created_at, updated_at, synced)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    task.id.as_str(),
                    task.owner_id.clone(),
                    task.title.clone(),
                    task.description.clone(),
                    i32::from(task.completed),
                    task.reminder_at,
                    task.created_at,
                    task.updated_at,
                    i32::from(task.synced)
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self, owner_id: &str) -> Result<Vec<Task>> {
        self.collect_tasks(
            &format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE owner_id = ?
                 ORDER BY updated_at DESC"
            ),
            owner_id,
        )
        .await
    }

    async fn get_unsynced(&self, owner_id: &str) -> Result<Vec<Task>> {
        // Oldest first so long-stuck records flush before fresh ones
        self.collect_tasks(
            &format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE owner_id = ? AND synced = 0
                 ORDER BY updated_at ASC"
            ),
            owner_id,
        )
        .await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task> {
        let mut task = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        task.apply(patch, now_millis());

        let rows = self
            .conn
            .execute(
                "UPDATE tasks SET title = ?, description = ?, completed = ?, reminder_at = ?,
                                  updated_at = ?, synced = 0
                 WHERE id = ?",
                params![
                    task.title.clone(),
                    task.description.clone(),
                    i32::from(task.completed),
                    task.reminder_at,
                    task.updated_at,
                    id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(task)
    }

    async fn mark_synced(&self, id: &TaskId) -> Result<()> {
        self.conn
            .execute(
                "UPDATE tasks SET synced = 1 WHERE id = ?",
                params![id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?", params![id.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn replace(&self, task: &Task) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE tasks SET owner_id = ?, title = ?, description = ?, completed = ?,
                                  reminder_at = ?, created_at = ?, updated_at = ?, synced = ?
                 WHERE id = ?",
                params![
                    task.owner_id.clone(),
                    task.title.clone(),
                    task.description.clone(),
                    i32::from(task.completed),
                    task.reminder_at,
                    task.created_at,
                    task.updated_at,
                    i32::from(task.synced),
                    task.id.as_str()
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(task.id.to_string()));
        }

        Ok(())
    }
}
