//! Database operations and utility functions for task management.
//!
//! This module provides the `Database` struct for storing and managing tasks,
//! along with date parsing, formatting, and table-printing helpers shared by
//! the CLI and the TUI.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::board::PositionUpdate;
use crate::fields::*;
use crate::task::Task;

/// In-memory database for storing and managing tasks.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
}

impl Database {
    /// Load database from JSON file, creating a new empty database if file doesn't exist.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Database::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Error parsing DB, starting fresh: {e}");
                    Database::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading DB, starting fresh: {e}");
                Database::default()
            }
        }
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Remove a task by ID. Returns the removed task, if any.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// Apply a bulk status/position update set produced by the board engine.
    ///
    /// Unknown task ids are skipped. Touched tasks get a fresh
    /// `updated_at_utc` stamp. Returns the number of tasks changed.
    pub fn apply_updates(&mut self, updates: &[PositionUpdate], now_utc: i64) -> usize {
        let mut applied = 0;
        for update in updates {
            if let Some(task) = self.get_mut(&update.task_id) {
                task.status = update.status;
                task.position = update.position;
                task.updated_at_utc = now_utc;
                applied += 1;
            }
        }
        applied
    }

    /// Next position at the end of a status column, for newly created tasks.
    pub fn next_position(&self, status: TaskStatus) -> u32 {
        let count = self.tasks.iter().filter(|t| t.status == status).count();
        crate::board::position_for(count)
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - "end of week" / "eow"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Some(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Some(today + Duration::weeks(weeks));
            }
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // ISO week: Monday start.
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    let end = start + Duration::days(6);
    (start, end)
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

/// Format a task status for display.
pub fn format_status(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Backlog => "Backlog",
        TaskStatus::Todo => "Todo",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::InReview => "In Review",
        TaskStatus::Done => "Done",
    }
}

/// Format a priority level for display.
pub fn format_priority(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Low => "Low",
        TaskPriority::Medium => "Medium",
        TaskPriority::High => "High",
        TaskPriority::Urgent => "Urgent",
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    // Header.
    println!(
        "{:<10} {:<12} {:<8} {:<10} {:<16} {:<14} {}",
        "ID", "Status", "Pri", "Due", "Project", "Assignee", "Title"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let due = format_due_relative(t.due, today);
        let assignee = t
            .assignee
            .as_ref()
            .map_or("-".to_string(), |a| a.display_name().to_string());
        println!(
            "{:<10} {:<12} {:<8} {:<10} {:<16} {:<14} {}",
            short_id(&t.id),
            format_status(t.status),
            format_priority(t.priority),
            due,
            truncate(&t.project.name, 16),
            truncate(&assignee, 14),
            t.title
        );
    }
}

/// First eight characters of a task id, enough to disambiguate locally.
pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(8)
        .map_or(id.len(), |(byte_idx, _)| byte_idx);
    &id[..end]
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Resolve a task identifier (full id, id prefix, or exact title) to a task id.
/// Returns an error if the identifier is ambiguous or unknown.
pub fn resolve_task_identifier(identifier: &str, db: &Database) -> Result<String, String> {
    if db.get(identifier).is_some() {
        return Ok(identifier.to_string());
    }

    let prefix_matches: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| t.id.starts_with(identifier))
        .collect();
    match prefix_matches.len() {
        1 => return Ok(prefix_matches[0].id.clone()),
        n if n > 1 => {
            return Err(format!(
                "Identifier '{}' matches {} task ids; use more characters",
                identifier, n
            ));
        }
        _ => {}
    }

    let title_matches: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| t.title.to_lowercase() == identifier.to_lowercase())
        .collect();
    match title_matches.len() {
        0 => Err(format!("No task found matching '{}'", identifier)),
        1 => Ok(title_matches[0].id.clone()),
        _ => {
            let mut error_msg = format!("Multiple tasks titled '{}':\n", identifier);
            for task in title_matches {
                error_msg.push_str(&format!(
                    "  {}: {} [{}]\n",
                    short_id(&task.id),
                    task.title,
                    task.project.name
                ));
            }
            error_msg.push_str("Please use the id instead.");
            Err(error_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ProjectRef;

    fn task(id: &str, status: TaskStatus, position: u32) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due: None,
            position,
            project: ProjectRef {
                id: "proj-1".into(),
                name: "Launch".into(),
                workspace_id: "ws-1".into(),
                workspace_name: "Acme".into(),
            },
            assignee: None,
            creator_id: "user-1".into(),
            created_at_utc: 1_700_000_000,
            updated_at_utc: 1_700_000_000,
        }
    }

    #[test]
    fn apply_updates_is_a_bulk_write_by_id() {
        let mut db = Database {
            tasks: vec![
                task("aaaa", TaskStatus::Todo, 1000),
                task("bbbb", TaskStatus::Todo, 2000),
            ],
        };
        let updates = vec![
            PositionUpdate {
                task_id: "aaaa".into(),
                status: TaskStatus::InProgress,
                position: 1000,
            },
            PositionUpdate {
                task_id: "bbbb".into(),
                status: TaskStatus::Todo,
                position: 1000,
            },
            PositionUpdate {
                task_id: "missing".into(),
                status: TaskStatus::Done,
                position: 1000,
            },
        ];
        let applied = db.apply_updates(&updates, 1_800_000_000);
        assert_eq!(applied, 2);

        let a = db.get("aaaa").unwrap();
        assert_eq!(a.status, TaskStatus::InProgress);
        assert_eq!(a.updated_at_utc, 1_800_000_000);
        let b = db.get("bbbb").unwrap();
        assert_eq!(b.position, 1000);
        assert!(db.get("missing").is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        let db = Database {
            tasks: vec![task("aaaa", TaskStatus::InReview, 1000)],
        };
        db.save(&path).unwrap();

        let loaded = Database::load(&path);
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0], db.tasks[0]);
    }

    #[test]
    fn load_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("nope.json"));
        assert!(db.tasks.is_empty());
    }

    #[test]
    fn status_serialization_is_screaming_snake() {
        let db = Database {
            tasks: vec![task("aaaa", TaskStatus::InProgress, 1000)],
        };
        let json = serde_json::to_string(&db).unwrap();
        assert!(json.contains("\"IN_PROGRESS\""));
        assert!(json.contains("\"MEDIUM\""));
    }

    #[test]
    fn next_position_appends_at_column_end() {
        let db = Database {
            tasks: vec![
                task("aaaa", TaskStatus::Todo, 1000),
                task("bbbb", TaskStatus::Todo, 2000),
                task("cccc", TaskStatus::Done, 1000),
            ],
        };
        assert_eq!(db.next_position(TaskStatus::Todo), 3000);
        assert_eq!(db.next_position(TaskStatus::Backlog), 1000);
    }

    #[test]
    fn parse_due_input_variants() {
        let today = Local::now().date_naive();
        assert_eq!(parse_due_input("today"), Some(today));
        assert_eq!(parse_due_input("Tomorrow"), Some(today + Duration::days(1)));
        assert_eq!(parse_due_input("in 3d"), Some(today + Duration::days(3)));
        assert_eq!(parse_due_input("in 2w"), Some(today + Duration::weeks(2)));
        assert_eq!(
            parse_due_input("2026-03-15"),
            NaiveDate::from_ymd_opt(2026, 3, 15)
        );
        assert_eq!(parse_due_input("not a date"), None);
    }

    #[test]
    fn resolve_identifier_by_prefix_and_title() {
        let mut db = Database {
            tasks: vec![
                task("abc123", TaskStatus::Todo, 1000),
                task("abd456", TaskStatus::Todo, 2000),
            ],
        };
        db.tasks[0].title = "Ship it".into();

        assert_eq!(resolve_task_identifier("abc123", &db).unwrap(), "abc123");
        assert_eq!(resolve_task_identifier("abc", &db).unwrap(), "abc123");
        assert!(resolve_task_identifier("ab", &db).is_err());
        assert_eq!(resolve_task_identifier("ship it", &db).unwrap(), "abc123");
        assert!(resolve_task_identifier("nothing", &db).is_err());
    }
}
