use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tusk_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No task title provided")]
    EmptyTitle,
    #[error("Task ID cannot be empty")]
    EmptyTaskId,
    #[error("Task not found for id/prefix: {0}")]
    TaskNotFound(String),
    #[error("{0}")]
    AmbiguousTaskId(String),
    #[error("Invalid reminder time '{0}'; use RFC 3339 (2026-08-04T09:00:00Z) or Unix milliseconds")]
    InvalidReminder(String),
    #[error("Nothing to edit; pass --title, --description, --remind-at, or --clear-reminder")]
    NothingToEdit,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Set TUSK_API_URL (and optionally TUSK_API_TOKEN) to point at your task service."
    )]
    SyncNotConfigured,
}
