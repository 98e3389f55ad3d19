//! Command implementations for the CLI interface.
//!
//! This module contains all the command handlers that implement the various
//! subcommands, from basic CRUD operations to the board reordering commands
//! and the kanban TUI.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Local, Utc};

use crate::board::Board;
use crate::db::*;
use crate::fields::*;
use crate::filter::{filter_tasks, sort_tasks, FilterSpec};
use crate::task::{Assignee, ProjectRef, Task};
use crate::tui::run::run_board_tui;
use crate::workspace::sanitize_workspace_name;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the kanban board interface.
    Board,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Project name within the workspace.
        #[arg(long, default_value = "General")]
        project: Option<String>,
        /// Priority: low | medium | high | urgent.
        #[arg(long, value_enum, default_value_t = TaskPriority::Medium)]
        priority: TaskPriority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", or "eow".
        #[arg(long)]
        due: Option<String>,
        /// Assignee display name.
        #[arg(long)]
        assignee: Option<String>,
        /// Assignee email (required when --assignee is set).
        #[arg(long)]
        assignee_email: Option<String>,
        /// Status column: backlog | todo | in-progress | in-review | done.
        #[arg(long, value_enum, default_value_t = TaskStatus::Todo)]
        status: TaskStatus,
    },

    /// List tasks with optional filters.
    List {
        /// Filter by status. May be repeated.
        #[arg(long, value_enum)]
        status: Vec<TaskStatus>,
        /// Filter by priority. May be repeated.
        #[arg(long, value_enum)]
        priority: Vec<TaskPriority>,
        /// Case-insensitive search over title, description, and project.
        #[arg(long)]
        search: Option<String>,
        /// Earliest due date (inclusive). Accepts the same forms as --due.
        #[arg(long)]
        due_from: Option<String>,
        /// Latest due date (inclusive).
        #[arg(long)]
        due_to: Option<String>,
        /// Filter by project name.
        #[arg(long)]
        project: Option<String>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Due)]
        sort: SortKey,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Print per-status and per-priority counts of the filtered set.
        #[arg(long)]
        stats: bool,
    },

    /// View a single task by id, id prefix, or title.
    View {
        /// Task id or title.
        id: String,
    },

    /// Update fields on a task.
    Update {
        /// Task id or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<TaskPriority>,
        /// New due date.
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date.
        #[arg(long)]
        clear_due: bool,
        /// New status column; the task is appended to that column.
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        /// Assignee display name.
        #[arg(long)]
        assignee: Option<String>,
        /// Assignee email.
        #[arg(long)]
        assignee_email: Option<String>,
        /// Remove the assignee.
        #[arg(long)]
        unassign: bool,
    },

    /// Move a task to a column position, like a drag on the board.
    Move {
        /// Task id or title.
        id: String,
        /// Destination status column.
        #[arg(long, value_enum)]
        to: TaskStatus,
        /// Zero-based slot in the destination column (default: end).
        #[arg(long)]
        at: Option<usize>,
    },

    /// Mark a task done (moved to the end of the Done column).
    Done {
        /// Task id or title.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task id or title.
        id: String,
    },

    /// List projects referenced by tasks in this workspace.
    Projects,

    /// List known workspaces.
    Workspaces,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Persist the database, reporting failure on stderr.
fn save_or_exit(db: &Database, db_path: &Path) {
    if let Err(e) = db.save(db_path) {
        eprintln!("Failed to save board: {}", e);
        std::process::exit(1);
    }
}

fn resolve_or_exit(identifier: &str, db: &Database) -> String {
    match resolve_task_identifier(identifier, db) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Combine the `--assignee`/`--assignee-email` pair into an assignee.
///
/// A name without an email is rejected; the email doubles as the id.
fn assignee_from_args(
    name: Option<String>,
    email: Option<String>,
) -> Result<Option<Assignee>, String> {
    match (name, email) {
        (None, None) => Ok(None),
        (name, Some(email)) => Ok(Some(Assignee {
            id: email.clone(),
            name,
            email,
        })),
        (Some(_), None) => Err("--assignee requires --assignee-email.".to_string()),
    }
}

fn parse_due_or_exit(input: &str) -> chrono::NaiveDate {
    match parse_due_input(input) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised date: '{}'", input);
            std::process::exit(1);
        }
    }
}

/// Run one board move against the flat task list and persist the update set.
///
/// `dest_index` of `None` appends to the destination column. Returns the
/// number of position records written.
fn reorder_task(
    db: &mut Database,
    id: &str,
    dest_status: TaskStatus,
    dest_index: Option<usize>,
) -> Result<usize, String> {
    let src_status = db
        .get(id)
        .map(|t| t.status)
        .ok_or_else(|| format!("Task {} not found", id))?;

    let board = Board::from_tasks(&db.tasks);
    let src_index = board
        .column(src_status)
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| format!("Task {} missing from its column", id))?;

    // usize::MAX clamps to the end of the destination column.
    let dest_index = dest_index.unwrap_or(usize::MAX);
    let outcome = board.move_task(src_status, src_index, dest_status, dest_index);
    let applied = db.apply_updates(&outcome.updates, Utc::now().timestamp());
    Ok(applied)
}

pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    workspace_name: &str,
    title: String,
    desc: Option<String>,
    project: Option<String>,
    priority: TaskPriority,
    due: Option<String>,
    assignee: Option<String>,
    assignee_email: Option<String>,
    status: TaskStatus,
) {
    if title.trim().is_empty() {
        eprintln!("Title cannot be empty.");
        std::process::exit(1);
    }

    let due = due.as_deref().map(parse_due_or_exit);

    let assignee = match assignee_from_args(assignee, assignee_email) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let project_name = project.unwrap_or_else(|| "General".to_string());
    let workspace_id = sanitize_workspace_name(workspace_name);
    let project_ref = ProjectRef {
        id: format!("{}/{}", workspace_id, sanitize_workspace_name(&project_name)),
        name: project_name,
        workspace_id,
        workspace_name: workspace_name.to_string(),
    };

    let now_utc = Utc::now().timestamp();
    let task = Task {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        description: desc,
        status,
        priority,
        due,
        position: db.next_position(status),
        project: project_ref,
        assignee,
        creator_id: std::env::var("USER").unwrap_or_else(|_| "local".to_string()),
        created_at_utc: now_utc,
        updated_at_utc: now_utc,
    };

    let id = task.id.clone();
    let task_title = task.title.clone();
    db.tasks.push(task);
    save_or_exit(db, db_path);
    println!("Added {} \"{}\"", short_id(&id), task_title);
}

pub fn cmd_list(
    db: &Database,
    status: Vec<TaskStatus>,
    priority: Vec<TaskPriority>,
    search: Option<String>,
    due_from: Option<String>,
    due_to: Option<String>,
    project: Option<String>,
    sort: SortKey,
    desc: bool,
    limit: Option<usize>,
    stats: bool,
) {
    // Project filtering on the CLI is by name; map it to the stored id.
    let project_id = project.as_deref().map(|name| {
        db.tasks
            .iter()
            .find(|t| t.project.name.eq_ignore_ascii_case(name))
            .map(|t| t.project.id.clone())
            .unwrap_or_else(|| name.to_string())
    });

    let spec = FilterSpec {
        status,
        priority,
        search_term: search.unwrap_or_default(),
        due_start: due_from.as_deref().map(parse_due_or_exit),
        due_end: due_to.as_deref().map(parse_due_or_exit),
        project_id,
        workspace_id: None,
    };

    let outcome = filter_tasks(&db.tasks, &spec);
    let mut rows = outcome.filtered;
    let dir = if desc { SortDir::Desc } else { SortDir::Asc };
    sort_tasks(&mut rows, sort, dir);
    if let Some(n) = limit {
        rows.truncate(n);
    }

    print_table(&rows);

    if spec.is_active() {
        println!(
            "\n{} of {} tasks match.",
            outcome.stats.filtered, outcome.stats.total
        );
    }

    if stats {
        println!("\nBy status:");
        for s in TaskStatus::ALL {
            println!("  {:<12} {}", format_status(s), outcome.stats.by_status[&s]);
        }
        println!("By priority:");
        for p in TaskPriority::ALL {
            println!(
                "  {:<12} {}",
                format_priority(p),
                outcome.stats.by_priority[&p]
            );
        }
    }
}

pub fn cmd_view(db: &Database, id: String) {
    let id = resolve_or_exit(&id, db);
    let Some(task) = db.get(&id) else {
        eprintln!("Task {} not found", id);
        std::process::exit(1);
    };

    let today = Local::now().date_naive();
    println!("Id:        {}", task.id);
    println!("Title:     {}", task.title);
    println!("Status:    {}", format_status(task.status));
    println!("Priority:  {}", format_priority(task.priority));
    println!(
        "Due:       {}",
        format_due_relative(task.due, today)
    );
    println!("Position:  {}", task.position);
    println!(
        "Project:   {} ({})",
        task.project.name, task.project.workspace_name
    );
    match &task.assignee {
        Some(a) => println!("Assignee:  {} <{}>", a.display_name(), a.email),
        None => println!("Assignee:  -"),
    }
    if let Some(d) = &task.description {
        println!("\n{}", d);
    }
}

pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: String,
    title: Option<String>,
    desc: Option<String>,
    priority: Option<TaskPriority>,
    due: Option<String>,
    clear_due: bool,
    status: Option<TaskStatus>,
    assignee: Option<String>,
    assignee_email: Option<String>,
    unassign: bool,
) {
    let id = resolve_or_exit(&id, db);
    let due = due.as_deref().map(parse_due_or_exit);
    let now_utc = Utc::now().timestamp();

    {
        let Some(task) = db.get_mut(&id) else {
            eprintln!("Task {} not found", id);
            std::process::exit(1);
        };
        if let Some(t) = title {
            if t.trim().is_empty() {
                eprintln!("Title cannot be empty.");
                std::process::exit(1);
            }
            task.title = t;
        }
        if let Some(d) = desc {
            task.description = Some(d);
        }
        if let Some(p) = priority {
            task.priority = p;
        }
        if clear_due {
            task.due = None;
        } else if let Some(d) = due {
            task.due = Some(d);
        }
        if unassign {
            task.assignee = None;
        } else if assignee.is_some() || assignee_email.is_some() {
            match assignee_from_args(assignee, assignee_email) {
                Ok(a) => task.assignee = a,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        task.updated_at_utc = now_utc;
    }

    // Status changes go through the board engine so column positions stay
    // consistent.
    if let Some(new_status) = status {
        if let Err(e) = reorder_task(db, &id, new_status, None) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    save_or_exit(db, db_path);
    println!("Updated {}", short_id(&id));
}

pub fn cmd_move(db: &mut Database, db_path: &Path, id: String, to: TaskStatus, at: Option<usize>) {
    let id = resolve_or_exit(&id, db);
    match reorder_task(db, &id, to, at) {
        Ok(applied) => {
            save_or_exit(db, db_path);
            println!(
                "Moved {} to {} ({} position update{})",
                short_id(&id),
                format_status(to),
                applied,
                if applied == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

pub fn cmd_done(db: &mut Database, db_path: &Path, id: String) {
    cmd_move(db, db_path, id, TaskStatus::Done, None);
}

pub fn cmd_delete(db: &mut Database, db_path: &Path, id: String) {
    let id = resolve_or_exit(&id, db);
    match db.remove(&id) {
        Some(task) => {
            save_or_exit(db, db_path);
            println!("Deleted {} \"{}\"", short_id(&id), task.title);
        }
        None => {
            eprintln!("Task {} not found", id);
            std::process::exit(1);
        }
    }
}

pub fn cmd_projects(db: &Database) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in &db.tasks {
        *counts.entry(t.project.name.as_str()).or_default() += 1;
    }
    if counts.is_empty() {
        println!("No projects yet.");
        return;
    }
    println!("{:<24} {}", "Project", "Tasks");
    for (name, count) in counts {
        println!("{:<24} {}", name, count);
    }
}

pub fn cmd_workspaces(board_dir: &Path) {
    match crate::workspace::discover_workspaces(board_dir) {
        Ok(workspaces) if !workspaces.is_empty() => {
            for ws in workspaces {
                println!("{}", ws.display_name);
            }
        }
        Ok(_) => println!("No workspaces yet. Create one with --workspace <name>."),
        Err(e) => {
            eprintln!("Failed to list workspaces: {}", e);
            std::process::exit(1);
        }
    }
}

pub fn cmd_board(db_path: &Path) {
    if let Err(e) = run_board_tui(db_path) {
        eprintln!("Board UI error: {}", e);
        std::process::exit(1);
    }
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    let mut cmd = crate::cli::Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
