//! # TB - Task Board CLI
//!
//! A file-backed task board manager with multi-criteria filtering and an
//! interactive kanban TUI.
//!
//! ## Key Features
//!
//! - **Kanban Board**: Five status columns (Backlog → Todo → In Progress →
//!   In Review → Done) with keyboard-driven card movement
//! - **Rich Task Metadata**: Priority, due dates, projects, assignees
//! - **Multi-Workspace Support**: Each workspace is a separate local JSON
//!   board file
//! - **Filtering & Sorting**: Combine status, priority, text search, due-date
//!   range, and project filters; sort by any column
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task
//! tb add "Implement user authentication" --project auth --priority high
//!
//! # List open work, most urgent first
//! tb list --status todo --status in-progress --sort priority --desc
//!
//! # Move a card, exactly like a drag on the board
//! tb move a1b2c3d4 --to in-review --at 0
//!
//! # Launch the kanban board
//! tb board
//! ```
//!
//! Data is stored locally in `~/.taskboard/`, one `<workspace>_board.json`
//! file per workspace. Source control or back up that folder as you see fit.

use std::path::PathBuf;

use clap::Parser;

pub mod board;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod fields;
pub mod filter;
pub mod task;
pub mod workspace;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use db::Database;
use workspace::{get_most_recent_workspace, Workspace};

fn main() {
    let cli = Cli::parse();

    // Completions need no board file at all.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    // Determine the board directory.
    let board_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf()
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let dir = PathBuf::from(home).join(".taskboard");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Failed to create board directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        dir
    };

    if let Commands::Workspaces = cli.command {
        cmd_workspaces(&board_dir);
        return;
    }

    // Resolve the workspace board file: explicit --db wins, then --workspace,
    // then the most recently used board, then a fresh Default workspace.
    let (db_path, workspace_name) = if let Some(db_path) = cli.db {
        let name = Workspace::from_file(db_path.clone())
            .map(|ws| ws.display_name)
            .unwrap_or_else(|| "Default".to_string());
        (db_path, name)
    } else if let Some(name) = cli.workspace {
        let ws = Workspace::new(&name, &board_dir);
        if let Err(e) = ws.create_if_not_exists() {
            eprintln!("Failed to create workspace '{}': {}", name, e);
            std::process::exit(1);
        }
        (ws.file_path, ws.display_name)
    } else {
        match get_most_recent_workspace(&board_dir) {
            Ok(Some(ws)) => (ws.file_path, ws.display_name),
            _ => {
                let ws = Workspace::new("Default", &board_dir);
                if let Err(e) = ws.create_if_not_exists() {
                    eprintln!("Failed to create default workspace: {}", e);
                    std::process::exit(1);
                }
                (ws.file_path, ws.display_name)
            }
        }
    };

    // The TUI owns its database lifecycle; don't load one just to drop it.
    if let Commands::Board = cli.command {
        cmd_board(&db_path);
        return;
    }

    let mut db = Database::load(&db_path);

    match cli.command {
        Commands::Board => unreachable!("Board command handled above"),

        Commands::Add {
            title,
            desc,
            project,
            priority,
            due,
            assignee,
            assignee_email,
            status,
        } => cmd_add(
            &mut db,
            &db_path,
            &workspace_name,
            title,
            desc,
            project,
            priority,
            due,
            assignee,
            assignee_email,
            status,
        ),

        Commands::List {
            status,
            priority,
            search,
            due_from,
            due_to,
            project,
            sort,
            desc,
            limit,
            stats,
        } => cmd_list(
            &db, status, priority, search, due_from, due_to, project, sort, desc, limit, stats,
        ),

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update {
            id,
            title,
            desc,
            priority,
            due,
            clear_due,
            status,
            assignee,
            assignee_email,
            unassign,
        } => cmd_update(
            &mut db,
            &db_path,
            id,
            title,
            desc,
            priority,
            due,
            clear_due,
            status,
            assignee,
            assignee_email,
            unassign,
        ),

        Commands::Move { id, to, at } => cmd_move(&mut db, &db_path, id, to, at),

        Commands::Done { id } => cmd_done(&mut db, &db_path, id),

        Commands::Delete { id } => cmd_delete(&mut db, &db_path, id),

        Commands::Projects => cmd_projects(&db),

        Commands::Workspaces => unreachable!("Workspaces command handled above"),

        Commands::Completions { .. } => unreachable!("Completions command handled above"),
    }
}
