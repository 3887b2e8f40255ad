use std::path::Path;

use crate::commands::common::{open_context, resolve_task, short_id};
use crate::error::CliError;

pub async fn run_done(id: &str, db_path: &Path, owner: String) -> Result<(), CliError> {
    let ctx = open_context(db_path, owner).await?;

    let task = resolve_task(&ctx.store, &ctx.owner, id).await?;
    let toggled = ctx.mutator.toggle_completed(&task.id).await?;
    ctx.mutator.flush().await;

    if toggled.completed {
        println!("Completed {}  {}", short_id(&toggled.id), toggled.title);
    } else {
        println!("Reopened {}  {}", short_id(&toggled.id), toggled.title);
    }
    Ok(())
}
