//! Runtime configuration for the remote service and sync cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cadence for the recurring background sync
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Default cadence for reachability probes
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Connection settings for the remote task service.
///
/// These are safe-to-ship endpoint values; the auth token is the only
/// secret and is expected to come from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Base URL of the task API (e.g. `https://api.tusk.example`)
    pub base_url: String,
    /// Bearer token attached to every request when present
    pub auth_token: Option<String>,
}

impl RemoteConfig {
    /// Create a configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Tunables for background sync behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// How often the auto-sync timer fires
    pub auto_sync_interval: Duration,
    /// Endpoint probed to detect reachability; `None` disables probing
    pub probe_url: Option<String>,
    /// How often the reachability probe fires
    pub probe_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_sync_interval: DEFAULT_SYNC_INTERVAL,
            probe_url: None,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }
}

impl SyncOptions {
    /// Set the auto-sync cadence
    #[must_use]
    pub const fn with_auto_sync_interval(mut self, interval: Duration) -> Self {
        self.auto_sync_interval = interval;
        self
    }

    /// Set the reachability probe endpoint
    #[must_use]
    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_config_builder_sets_token() {
        let config = RemoteConfig::new("https://api.tusk.example").with_auth_token("secret");
        assert_eq!(config.base_url, "https://api.tusk.example");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn sync_options_defaults() {
        let options = SyncOptions::default();
        assert_eq!(options.auto_sync_interval, DEFAULT_SYNC_INTERVAL);
        assert_eq!(options.probe_url, None);
    }
}
