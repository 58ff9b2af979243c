//! Command-line surface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "contestdesk", version, about = "Organize programming-contest problems")]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, env = "CONTESTDESK_DB")]
    pub db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "CONTESTDESK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true, env = "CONTESTDESK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a problem at the end of the list.
    Add(AddArgs),
    /// Change names or content of a problem.
    Edit(EditArgs),
    /// Print one problem.
    Show {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        json: bool,
    },
    /// Print the problem list in display order.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Move the problem at FROM to position TO.
    Move { from: String, to: String },
    /// Delete a problem and its list entry.
    Delete {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Report mismatches between the list and stored problems.
    Check,
    /// Rewrite the list so every stored problem appears once.
    Repair,
    /// Export problem packages.
    Export {
        /// Export every problem instead of one.
        #[arg(long, conflicts_with_all = ["position", "id"])]
        all: bool,
        #[command(flatten)]
        target: OptionalTargetArgs,
        /// Output file; defaults to the exporter's file name.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Whole-store JSON backup.
    #[command(subcommand)]
    Backup(BackupCommand),
    /// Print the core library version.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write a backup of every problem.
    Download {
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Restore problems from a backup file.
    Upload { path: PathBuf },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Stable identifier; generated when omitted.
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub name: String,
    /// Defaults to NAME.
    #[arg(long)]
    pub full_name: Option<String>,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub full_name: Option<String>,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Debug, Args)]
pub struct ContentArgs {
    /// Problem body text.
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,
    /// Read the problem body from a file.
    #[arg(long)]
    pub content_file: Option<PathBuf>,
}

/// Selects a problem by list position or by id.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// List label (A, B, ...) or zero-based position.
    #[arg(required_unless_present = "id", conflicts_with = "id")]
    pub position: Option<String>,
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct OptionalTargetArgs {
    /// List label (A, B, ...) or zero-based position.
    #[arg(conflicts_with = "id")]
    pub position: Option<String>,
    #[arg(long)]
    pub id: Option<String>,
}
