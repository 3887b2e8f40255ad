//! Remote task service client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::RemoteConfig;
use crate::models::{Task, TaskId};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const REMOTE_HTTP_TIMEOUT_SECS: u64 = 10;

/// Errors from the remote task service
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Authoritative store for task records, keyed by the same ids as the
/// local store.
///
/// Implementations must keep `create` and `update` independently safe to
/// retry; the engine's existence-check-then-branch relies on it.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch a task by id; `None` when the remote has no such record
    async fn get(&self, id: &TaskId) -> RemoteResult<Option<Task>>;

    /// Create a task record
    async fn create(&self, task: &Task) -> RemoteResult<()>;

    /// Overwrite a task record with the full local payload
    async fn update(&self, task: &Task) -> RemoteResult<()>;

    /// Delete a task record; deleting an absent id must succeed
    async fn delete(&self, id: &TaskId) -> RemoteResult<()>;

    /// List all task records belonging to an owner
    async fn list_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Task>>;
}

/// HTTP implementation of [`RemoteStore`] over the Tusk task API.
#[derive(Clone)]
pub struct HttpRemoteStore {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let base_url = normalize_endpoint(config.base_url.clone())?;
        let auth_token = normalize_text_option(config.auth_token.clone());
        Ok(Self {
            base_url,
            auth_token,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REMOTE_HTTP_TIMEOUT_SECS))
                .build()?,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn ensure_success(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, id: &TaskId) -> RemoteResult<Option<Task>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v1/tasks/{id}"))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::ensure_success(response).await?;
        let dto = response.json::<TaskDto>().await?;
        dto.into_task().map(Some)
    }

    async fn create(&self, task: &Task) -> RemoteResult<()> {
        let response = self
            .request(reqwest::Method::POST, "/v1/tasks")
            .json(&TaskDto::from_task(task))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn update(&self, task: &Task) -> RemoteResult<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/v1/tasks/{}", task.id))
            .json(&TaskDto::from_task(task))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/v1/tasks/{id}"))
            .send()
            .await?;

        // Deleting an already-deleted record is a success
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<Task>> {
        let response = self
            .request(reqwest::Method::GET, "/v1/tasks")
            .query(&[("owner", owner_id)])
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let dtos = response.json::<Vec<TaskDto>>().await?;
        dtos.into_iter().map(TaskDto::into_task).collect()
    }
}

/// Wire representation of a task record.
///
/// The API speaks camelCase and carries no `synced` flag; that flag only
/// has meaning on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDto {
    id: String,
    owner_id: String,
    title: String,
    #[serde(default)]
    description: String,
    completed: bool,
    #[serde(default)]
    reminder_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl TaskDto {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.as_str(),
            owner_id: task.owner_id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed: task.completed,
            reminder_at: task.reminder_at,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }

    /// Records read from the remote are by definition synced.
    fn into_task(self) -> RemoteResult<Task> {
        let id = self
            .id
            .parse()
            .map_err(|_| RemoteError::InvalidPayload(format!("invalid task id: {}", self.id)))?;
        Ok(Task {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            reminder_at: self.reminder_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            synced: true,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return message.trim().to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        compact_text(trimmed)
    }
}

fn normalize_endpoint(raw: String) -> RemoteResult<String> {
    let endpoint = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&endpoint) {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}
