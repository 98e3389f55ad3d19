use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed task board CLI.
/// Boards live under ~/.taskboard, one JSON file per workspace.
#[derive(Parser)]
#[command(name = "tb", version, about = "Task board management CLI")]
pub struct Cli {
    /// Path to the JSON board file (overrides workspace selection).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Workspace to operate on (created on first use).
    #[arg(long, short = 'w', global = true)]
    pub workspace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
