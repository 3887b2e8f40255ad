use std::path::Path;

use crate::commands::common::{open_context, resolve_task, short_id};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, owner: String) -> Result<(), CliError> {
    let ctx = open_context(db_path, owner).await?;

    let task = resolve_task(&ctx.store, &ctx.owner, id).await?;
    ctx.mutator.delete(&task.id).await?;
    ctx.mutator.flush().await;

    println!("Deleted {}  {}", short_id(&task.id), task.title);
    Ok(())
}
