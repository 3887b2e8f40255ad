use std::path::Path;

use tusk_core::models::NewTask;

use crate::commands::common::{open_context, parse_reminder, resolve_title};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    description: Option<String>,
    remind_at: Option<String>,
    db_path: &Path,
    owner: String,
) -> Result<(), CliError> {
    let title = resolve_title(title_parts)?;
    let reminder_at = remind_at.as_deref().map(parse_reminder).transpose()?;

    let ctx = open_context(db_path, owner).await?;
    let task = ctx
        .mutator
        .create(
            &ctx.owner,
            NewTask {
                title,
                description: description.unwrap_or_default(),
                reminder_at,
            },
        )
        .await?;

    // One-shot process: wait out the fire-and-forget propagation
    ctx.mutator.flush().await;

    println!("{}", task.id);
    Ok(())
}
