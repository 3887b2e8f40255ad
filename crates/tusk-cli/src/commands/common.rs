use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use tusk_core::config::RemoteConfig;
use tusk_core::db::TaskStore;
use tusk_core::dispatch::TaskMutator;
use tusk_core::models::Task;
use tusk_core::net::ManualConnectivity;
use tusk_core::remote::{HttpRemoteStore, RemoteError, RemoteResult, RemoteStore};
use tusk_core::sync::SyncEngine;
use tusk_core::TaskId;

use crate::error::CliError;

/// Everything a one-shot command needs, wired together.
pub struct AppContext {
    pub store: TaskStore,
    pub engine: SyncEngine,
    pub mutator: TaskMutator,
    pub owner: String,
    pub remote_configured: bool,
}

/// Open the local store and wire up the engine and mutator.
///
/// With `TUSK_API_URL` unset the context runs local-only: connectivity is
/// pinned offline, so the engine never touches the placeholder remote and
/// every mutation simply stays unsynced.
pub async fn open_context(db_path: &Path, owner: String) -> Result<AppContext, CliError> {
    tracing::debug!("opening task store at {}", db_path.display());
    let store = TaskStore::open_path(db_path).await?;

    let remote_config = remote_config_from_env();
    let remote_configured = remote_config.is_some();
    let remote: Arc<dyn RemoteStore> = match remote_config {
        Some(config) => Arc::new(
            HttpRemoteStore::new(&config).map_err(|error| CliError::Config(error.to_string()))?,
        ),
        None => Arc::new(UnconfiguredRemote),
    };
    let connectivity = Arc::new(if remote_configured {
        ManualConnectivity::online()
    } else {
        ManualConnectivity::offline()
    });

    let engine = SyncEngine::new(store.clone(), remote, connectivity);
    let mutator = TaskMutator::new(store.clone(), engine.clone());

    Ok(AppContext {
        store,
        engine,
        mutator,
        owner,
        remote_configured,
    })
}

/// Placeholder remote used when no task service is configured.
///
/// Unreachable in practice: the local-only context pins connectivity
/// offline and the sync/watch commands bail out before the first call.
struct UnconfiguredRemote;

#[async_trait]
impl RemoteStore for UnconfiguredRemote {
    async fn get(&self, _id: &TaskId) -> RemoteResult<Option<Task>> {
        Err(unconfigured())
    }

    async fn create(&self, _task: &Task) -> RemoteResult<()> {
        Err(unconfigured())
    }

    async fn update(&self, _task: &Task) -> RemoteResult<()> {
        Err(unconfigured())
    }

    async fn delete(&self, _id: &TaskId) -> RemoteResult<()> {
        Err(unconfigured())
    }

    async fn list_by_owner(&self, _owner_id: &str) -> RemoteResult<Vec<Task>> {
        Err(unconfigured())
    }
}

fn unconfigured() -> RemoteError {
    RemoteError::InvalidConfiguration("no remote task service configured".to_string())
}

/// Read the remote service settings from the environment.
pub fn remote_config_from_env() -> Option<RemoteConfig> {
    let base_url = env::var("TUSK_API_URL").ok()?;
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return None;
    }

    let mut config = RemoteConfig::new(base_url);
    if let Ok(token) = env::var("TUSK_API_TOKEN") {
        if !token.trim().is_empty() {
            config = config.with_auth_token(token.trim());
        }
    }
    Some(config)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("TUSK_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| panic!("Failed to resolve CLI data directory"))
        .join("tusk")
        .join("tusk.db")
}

pub fn resolve_owner(cli_owner: Option<String>) -> String {
    cli_owner
        .or_else(|| env::var("TUSK_OWNER").ok())
        .map(|owner| owner.trim().to_string())
        .filter(|owner| !owner.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

/// Join quick-capture words into a title.
pub fn resolve_title(parts: &[String]) -> Result<String, CliError> {
    let title = parts.join(" ");
    let title = title.trim();
    if title.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(title.to_string())
    }
}

/// Parse a reminder argument: Unix milliseconds or RFC 3339.
pub fn parse_reminder(raw: &str) -> Result<i64, CliError> {
    let trimmed = raw.trim();
    if let Ok(millis) = trimmed.parse::<i64>() {
        return Ok(millis);
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|when| when.timestamp_millis())
        .map_err(|_| CliError::InvalidReminder(raw.to_string()))
}

/// Resolve a task from an exact id or a unique id prefix.
pub async fn resolve_task(
    store: &TaskStore,
    owner: &str,
    query: &str,
) -> Result<Task, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptyTaskId);
    }

    if let Ok(task_id) = query.parse::<TaskId>() {
        if let Some(task) = store.get_task(&task_id).await? {
            return Ok(task);
        }
    }

    let mut matches: Vec<Task> = store
        .list_tasks(owner)
        .await?
        .into_iter()
        .filter(|task| task.id.as_str().starts_with(query))
        .collect();

    match matches.len() {
        0 => Err(CliError::TaskNotFound(query.to_string())),
        1 => Ok(matches.remove(0)),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|task| short_id(&task.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousTaskId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub reminder_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub synced: bool,
    pub relative_time: String,
}

pub fn task_to_list_item(task: &Task) -> TaskListItem {
    let now_ms = Utc::now().timestamp_millis();
    TaskListItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        completed: task.completed,
        reminder_at: task.reminder_at,
        created_at: task.created_at,
        updated_at: task.updated_at,
        synced: task.synced,
        relative_time: format_relative_time(task.updated_at, now_ms),
    }
}

pub fn format_task_lines(tasks: &[Task]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    tasks
        .iter()
        .map(|task| {
            let mark = if task.completed { "[x]" } else { "[ ]" };
            let badge = if task.synced { "" } else { "  (unsynced)" };
            let relative_time = format_relative_time(task.updated_at, now_ms);
            format!(
                "{:<13} {mark} {:<40}  {relative_time}{badge}",
                short_id(&task.id),
                title_preview(task, 40),
            )
        })
        .collect()
}

// 13 characters covers the full millisecond timestamp prefix of a v7
// UUID; anything shorter collides for ids minted close together.
pub fn short_id(id: &TaskId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn title_preview(task: &Task, max_chars: usize) -> String {
    let collapsed = task.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}
