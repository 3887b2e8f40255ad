use std::path::Path;

use serde::Serialize;

use tusk_core::sync::QueueStatus;

use crate::commands::common::open_context;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusReport {
    owner: String,
    db_path: String,
    remote_configured: bool,
    sync_status: String,
    unsynced_count: usize,
    queue: QueueStatus,
}

pub async fn run_status(as_json: bool, db_path: &Path, owner: String) -> Result<(), CliError> {
    let ctx = open_context(db_path, owner).await?;

    let unsynced = ctx.store.unsynced_tasks(&ctx.owner).await?;
    let report = StatusReport {
        owner: ctx.owner.clone(),
        db_path: db_path.display().to_string(),
        remote_configured: ctx.remote_configured,
        sync_status: ctx.engine.status().to_string(),
        unsynced_count: unsynced.len(),
        queue: ctx.engine.queue_status(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Owner:            {}", report.owner);
    println!("Database:         {}", report.db_path);
    println!(
        "Remote:           {}",
        if report.remote_configured {
            "configured"
        } else {
            "not configured"
        }
    );
    println!("Sync status:      {}", report.sync_status);
    println!("Unsynced tasks:   {}", report.unsynced_count);
    println!("Queued retries:   {}", report.queue.count);
    Ok(())
}
