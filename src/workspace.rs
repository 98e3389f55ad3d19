//! Workspace management for multi-tenant board files.
//!
//! Each workspace owns one board database file with the naming convention
//! `<workspace_name>_board.json`. This module handles workspace discovery,
//! naming, and selection of the most recently used board.

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;

/// Represents a workspace with its name and board file path.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Workspace {
    /// Create a new workspace with the given display name.
    pub fn new(display_name: &str, board_dir: &Path) -> Self {
        let name = sanitize_workspace_name(display_name);
        let file_path = board_dir.join(format!("{}_board.json", name));

        Workspace {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Load a workspace from an existing board file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;

        if !file_name.ends_with("_board") {
            return None;
        }

        let name = file_name.strip_suffix("_board")?;
        let display_name = name.replace('_', " ");

        Some(Workspace {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    /// Create the board file for this workspace if it doesn't exist.
    pub fn create_if_not_exists(&self) -> Result<(), std::io::Error> {
        if !self.file_path.exists() {
            let db = Database::default();
            db.save(&self.file_path)?;
        }
        Ok(())
    }
}

/// Convert a display name to a safe workspace name for file naming.
/// Converts to lowercase and replaces spaces with underscores.
pub fn sanitize_workspace_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing workspaces in the board directory.
pub fn discover_workspaces(board_dir: &Path) -> Result<Vec<Workspace>, std::io::Error> {
    let mut workspaces = Vec::new();

    if !board_dir.exists() {
        return Ok(workspaces);
    }

    for entry in fs::read_dir(board_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(workspace) = Workspace::from_file(path) {
                workspaces.push(workspace);
            }
        }
    }

    workspaces.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    Ok(workspaces)
}

/// Find the most recently modified workspace board in the directory.
pub fn get_most_recent_workspace(board_dir: &Path) -> Result<Option<Workspace>, std::io::Error> {
    let workspaces = discover_workspaces(board_dir)?;

    if workspaces.is_empty() {
        return Ok(None);
    }

    let mut most_recent: Option<(Workspace, std::time::SystemTime)> = None;

    for workspace in workspaces {
        if let Ok(metadata) = fs::metadata(&workspace.file_path) {
            if let Ok(modified) = metadata.modified() {
                match most_recent {
                    None => most_recent = Some((workspace, modified)),
                    Some((_, current_time)) => {
                        if modified > current_time {
                            most_recent = Some((workspace, modified));
                        }
                    }
                }
            }
        }
    }

    Ok(most_recent.map(|(workspace, _)| workspace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_workspace_name() {
        assert_eq!(sanitize_workspace_name("My Workspace"), "my_workspace");
        assert_eq!(sanitize_workspace_name("Acme-Team_42"), "acme_team_42");
        assert_eq!(sanitize_workspace_name("Weird!@#Name"), "weird_name");
        assert_eq!(sanitize_workspace_name("  Extra   Spaces  "), "extra_spaces");
        assert_eq!(sanitize_workspace_name(""), "");
    }

    #[test]
    fn from_file_only_accepts_board_files() {
        let ws = Workspace::from_file(PathBuf::from("/tmp/acme_team_board.json")).unwrap();
        assert_eq!(ws.name, "acme_team");
        assert_eq!(ws.display_name, "acme team");

        assert!(Workspace::from_file(PathBuf::from("/tmp/notes.json")).is_none());
    }

    #[test]
    fn discover_finds_created_workspaces() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new("Acme Team", dir.path());
        ws.create_if_not_exists().unwrap();

        let found = discover_workspaces(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "acme_team");

        let recent = get_most_recent_workspace(dir.path()).unwrap().unwrap();
        assert_eq!(recent.name, "acme_team");
    }
}
