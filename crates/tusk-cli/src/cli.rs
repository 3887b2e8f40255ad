use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "tusk")]
#[command(about = "Local-first task manager that syncs when it can")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Owner whose tasks are read and written (default: $TUSK_OWNER)
    #[arg(long, global = true, value_name = "OWNER")]
    pub owner: Option<String>,

    /// Quick capture: tusk "buy milk"
    #[arg(trailing_var_arg = true)]
    pub title: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: Vec<String>,
        /// Longer free-form description
        #[arg(short, long)]
        description: Option<String>,
        /// Reminder time (RFC 3339 or Unix milliseconds)
        #[arg(long, value_name = "WHEN")]
        remind_at: Option<String>,
    },
    /// List tasks, most recently touched first
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Number of tasks to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a task's completion flag
    Done {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Edit an existing task
    Edit {
        /// Task ID or unique ID prefix
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New reminder time (RFC 3339 or Unix milliseconds)
        #[arg(long, value_name = "WHEN")]
        remind_at: Option<String>,
        /// Remove the reminder
        #[arg(long, conflicts_with = "remind_at")]
        clear_reminder: bool,
    },
    /// Delete an existing task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Push pending local changes to the remote service
    Sync {
        /// Also import the owner's remote tasks
        #[arg(long)]
        pull: bool,
    },
    /// Show sync state and pending work
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run in the foreground, syncing continuously
    Watch {
        /// Sync interval in seconds
        #[arg(long, default_value = "30")]
        interval: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
