use std::path::Path;

use crate::commands::common::{
    format_task_lines, open_context, task_to_list_item, TaskListItem,
};
use crate::error::CliError;

pub async fn run_list(
    all: bool,
    limit: usize,
    as_json: bool,
    db_path: &Path,
    owner: String,
) -> Result<(), CliError> {
    let ctx = open_context(db_path, owner).await?;

    let mut tasks = ctx.store.list_tasks(&ctx.owner).await?;
    if !all {
        tasks.retain(|task| !task.completed);
    }
    tasks.truncate(limit);

    if as_json {
        let items = tasks
            .iter()
            .map(task_to_list_item)
            .collect::<Vec<TaskListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    for line in format_task_lines(&tasks) {
        println!("{line}");
    }
    Ok(())
}
