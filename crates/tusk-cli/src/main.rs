//! Tusk CLI - local-first task capture from the terminal
//!
//! Every mutation lands in the local database first; the sync engine
//! pushes it to the remote service when connectivity allows.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::{resolve_db_path, resolve_owner};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let db_path = resolve_db_path(cli.db_path);
    let owner = resolve_owner(cli.owner);

    match cli.command {
        Some(Commands::Add {
            title,
            description,
            remind_at,
        }) => commands::add::run_add(&title, description, remind_at, &db_path, owner).await,
        Some(Commands::List { all, limit, json }) => {
            commands::list::run_list(all, limit, json, &db_path, owner).await
        }
        Some(Commands::Done { id }) => commands::done::run_done(&id, &db_path, owner).await,
        Some(Commands::Edit {
            id,
            title,
            description,
            remind_at,
            clear_reminder,
        }) => {
            commands::edit::run_edit(
                &id,
                title,
                description,
                remind_at,
                clear_reminder,
                &db_path,
                owner,
            )
            .await
        }
        Some(Commands::Delete { id }) => commands::delete::run_delete(&id, &db_path, owner).await,
        Some(Commands::Sync { pull }) => commands::sync::run_sync(pull, &db_path, owner).await,
        Some(Commands::Status { json }) => {
            commands::status::run_status(json, &db_path, owner).await
        }
        Some(Commands::Watch { interval }) => {
            commands::watch::run_watch(interval, &db_path, owner).await
        }
        Some(Commands::Completions { shell, output }) => {
            commands::completions::run_completions(shell, output.as_deref())
        }
        None => {
            // Quick capture: `tusk pick up groceries`
            if cli.title.is_empty() {
                Cli::command().print_help()?;
                println!();
                return Ok(());
            }
            commands::add::run_add(&cli.title, None, None, &db_path, owner).await
        }
    }
}
