use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tusk_core::config::SyncOptions;
use tusk_core::db::TaskStore;
use tusk_core::net::HttpProbeMonitor;
use tusk_core::remote::HttpRemoteStore;
use tusk_core::sync::SyncEngine;

use crate::commands::common::remote_config_from_env;
use crate::error::CliError;

/// Run the engine in the foreground: probe reachability, react to
/// transitions, and sync on a timer until interrupted.
pub async fn run_watch(interval_secs: u64, db_path: &Path, owner: String) -> Result<(), CliError> {
    let Some(remote_config) = remote_config_from_env() else {
        return Err(CliError::SyncNotConfigured);
    };

    let store = TaskStore::open_path(db_path).await?;
    let remote = Arc::new(
        HttpRemoteStore::new(&remote_config)
            .map_err(|error| CliError::Config(error.to_string()))?,
    );

    let probe_url = std::env::var("TUSK_PROBE_URL")
        .ok()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| format!("{}/healthz", remote_config.base_url.trim_end_matches('/')));
    let options = SyncOptions::default()
        .with_auto_sync_interval(Duration::from_secs(interval_secs.max(1)))
        .with_probe_url(probe_url.clone());

    let monitor = Arc::new(
        HttpProbeMonitor::new(probe_url, options.probe_interval)
            .map_err(|error| CliError::Config(error.to_string()))?,
    );
    monitor.start();

    let engine = SyncEngine::new(store, remote, monitor.clone());
    engine.setup_network_listener(&owner);
    engine.start_auto_sync(&owner, options.auto_sync_interval);

    println!("Watching tasks for '{owner}'; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    engine.shutdown();
    monitor.stop();
    println!("Stopped");
    Ok(())
}
