use std::path::Path;

use tusk_core::models::TaskPatch;

use crate::commands::common::{open_context, parse_reminder, resolve_task, short_id};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    title: Option<String>,
    description: Option<String>,
    remind_at: Option<String>,
    clear_reminder: bool,
    db_path: &Path,
    owner: String,
) -> Result<(), CliError> {
    let reminder_at = if clear_reminder {
        Some(None)
    } else {
        remind_at
            .as_deref()
            .map(parse_reminder)
            .transpose()?
            .map(Some)
    };

    let patch = TaskPatch {
        title,
        description,
        completed: None,
        reminder_at,
    };
    if patch.is_empty() {
        return Err(CliError::NothingToEdit);
    }

    let ctx = open_context(db_path, owner).await?;
    let task = resolve_task(&ctx.store, &ctx.owner, id).await?;
    let updated = ctx.mutator.update(&task.id, patch).await?;
    ctx.mutator.flush().await;

    println!("Updated {}  {}", short_id(&updated.id), updated.title);
    Ok(())
}
