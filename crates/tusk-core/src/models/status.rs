//! Shared sync state types.

use serde::{Deserialize, Serialize};

/// Aggregate sync state reported by the sync engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// No sync running and none attempted since going offline
    Idle,
    /// A sync pass is in flight
    Syncing,
    /// The last sync pass completed
    Synced,
    /// The last sync pass failed reading the local store
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Syncing => write!(f, "syncing"),
            Self::Synced => write!(f, "synced"),
            Self::Error => write!(f, "error"),
        }
    }
}
