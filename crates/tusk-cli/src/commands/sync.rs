use std::path::Path;

use crate::commands::common::open_context;
use crate::error::CliError;

pub async fn run_sync(pull: bool, db_path: &Path, owner: String) -> Result<(), CliError> {
    let ctx = open_context(db_path, owner).await?;
    if !ctx.remote_configured {
        return Err(CliError::SyncNotConfigured);
    }

    // Queued point-fixes first, then the full pass
    ctx.engine.process_retry_queue().await;
    ctx.engine.sync_now(&ctx.owner).await?;

    if pull {
        let report = ctx.engine.pull(&ctx.owner).await?;
        println!(
            "Pulled {} remote tasks ({} new, {} refreshed)",
            report.fetched, report.added, report.refreshed
        );
    }

    let queue = ctx.engine.queue_status();
    let unsynced = ctx.store.unsynced_tasks(&ctx.owner).await?.len();
    if queue.count == 0 && unsynced == 0 {
        println!("Sync completed");
    } else {
        println!("Sync completed; {unsynced} tasks still pending, {} queued retries", queue.count);
    }
    Ok(())
}
