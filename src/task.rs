//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single work
//! item, along with the denormalized project/workspace reference and the
//! optional assignee carried for display and search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Denormalized reference to the project a task belongs to.
///
/// Name and workspace are carried on the task itself so list/board views and
/// search never need a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
    pub workspace_id: String,
    pub workspace_name: String,
}

/// A workspace member a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

impl Assignee {
    /// Display name, falling back to the local part of the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// A work item on the board.
///
/// `position` orders the task within its status column; it is maintained by
/// the reorder engine in `board` and is meaningless across columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due: Option<NaiveDate>,
    pub position: u32,
    pub project: ProjectRef,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    pub creator_id: String,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}
