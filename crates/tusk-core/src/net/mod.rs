//! Network reachability monitoring.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::util::is_http_url;

/// Observes network reachability.
///
/// `is_online` answers from the last observed state without blocking;
/// `subscribe` yields a channel that fires on every transition.
pub trait Connectivity: Send + Sync {
    /// Last observed reachability state
    fn is_online(&self) -> bool;

    /// Subscribe to reachability transitions
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Manually driven connectivity source.
///
/// One-shot commands pin it to a fixed state; tests flip it to simulate
/// going offline and back.
pub struct ManualConnectivity {
    state: watch::Sender<bool>,
}

impl ManualConnectivity {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (state, _rx) = watch::channel(online);
        Self { state }
    }

    /// Connectivity pinned online
    #[must_use]
    pub fn online() -> Self {
        Self::new(true)
    }

    /// Connectivity pinned offline
    #[must_use]
    pub fn offline() -> Self {
        Self::new(false)
    }

    /// Report a reachability change; repeated states do not re-notify
    pub fn set_online(&self, online: bool) {
        self.state.send_if_modified(|state| {
            if *state == online {
                false
            } else {
                *state = online;
                true
            }
        });
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

/// Reachability monitor that probes an HTTP endpoint on an interval.
///
/// Any HTTP response counts as online (the network path is up even when
/// the endpoint answers 4xx/5xx); transport errors count as offline. The
/// state starts offline until the first probe lands.
pub struct HttpProbeMonitor {
    state: watch::Sender<bool>,
    client: reqwest::Client,
    probe_url: String,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl HttpProbeMonitor {
    pub fn new(probe_url: impl Into<String>, interval: Duration) -> Result<Self> {
        let probe_url = probe_url.into();
        if !is_http_url(&probe_url) {
            return Err(Error::InvalidInput(
                "probe URL must include http:// or https://".to_string(),
            ));
        }

        let (state, _rx) = watch::channel(false);
        let client = reqwest::Client::builder()
            .timeout(interval.min(Duration::from_secs(5)))
            .build()
            .map_err(crate::remote::RemoteError::Http)?;

        Ok(Self {
            state,
            client,
            probe_url,
            interval,
            handle: Mutex::new(None),
        })
    }

    /// Begin probing; calling again replaces the previous probe loop.
    pub fn start(&self) {
        let client = self.client.clone();
        let url = self.probe_url.clone();
        let state = self.state.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let online = client.head(&url).send().await.is_ok();
                let changed = state.send_if_modified(|current| {
                    if *current == online {
                        false
                    } else {
                        *current = online;
                        true
                    }
                });
                if changed {
                    tracing::info!(online, "network reachability changed");
                }
            }
        });

        let mut slot = self
            .handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    /// Stop probing; safe to call when no probe loop is running.
    pub fn stop(&self) {
        let mut slot = self
            .handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

impl Drop for HttpProbeMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Connectivity for HttpProbeMonitor {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
