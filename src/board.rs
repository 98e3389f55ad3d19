//! Kanban column partitioning and reordering.
//!
//! A [`Board`] is an ephemeral view of a flat task list, partitioned into one
//! ordered column per status. Moving a card, within a column or across
//! columns, is a pure computation: it returns a new board plus the minimal
//! set of [`PositionUpdate`] records the storage layer must persist. The
//! input board is never mutated, and invalid indices degrade to a no-op so
//! drag handlers never need to guard the call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fields::TaskStatus;
use crate::task::Task;

/// Gap between adjacent positions, leaving room for future insertions
/// without renumbering the whole column.
pub const POSITION_STEP: u32 = 1_000;

/// Upper bound on any stored position.
pub const POSITION_MAX: u32 = 1_000_000;

/// Position assigned to the card at `index` within its column.
pub const fn position_for(index: usize) -> u32 {
    let pos = (index as u32 + 1).saturating_mul(POSITION_STEP);
    if pos > POSITION_MAX {
        POSITION_MAX
    } else {
        pos
    }
}

/// One task whose persisted status/position must change after a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub task_id: String,
    pub status: TaskStatus,
    pub position: u32,
}

/// Result of a move: the new partition and the updates to persist.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub board: Board,
    pub updates: Vec<PositionUpdate>,
}

/// Tasks partitioned by status column, each column ordered by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    columns: BTreeMap<TaskStatus, Vec<Task>>,
}

impl Board {
    /// Partition a flat task list into status columns.
    ///
    /// Every status gets a column even when empty. Columns are ordered by
    /// ascending position; tasks sharing a position keep their input order.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut columns: BTreeMap<TaskStatus, Vec<Task>> =
            TaskStatus::ALL.iter().map(|&s| (s, Vec::new())).collect();
        for task in tasks {
            if let Some(column) = columns.get_mut(&task.status) {
                column.push(task.clone());
            }
        }
        for column in columns.values_mut() {
            column.sort_by_key(|t| t.position);
        }
        Board { columns }
    }

    /// The ordered cards of one column.
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns.get(&status).map_or(&[], Vec::as_slice)
    }

    /// Total card count across all columns.
    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    /// True when no column holds a card.
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(Vec::is_empty)
    }

    /// Move the card at `src_index` in the `src_status` column to
    /// `dest_index` in the `dest_status` column.
    ///
    /// Positions are renumbered as `min((index + 1) * 1000, 1_000_000)` for
    /// every card in the destination column and, on a cross-column move, the
    /// remaining cards of the source column. `updates` lists the moved card
    /// first, then every other card whose position actually changed; cards
    /// untouched by the move never appear.
    ///
    /// An identity move or an out-of-range `src_index` returns the board
    /// unchanged with no updates. `dest_index` is an insertion point and
    /// clamps to the end of the destination column.
    pub fn move_task(
        &self,
        src_status: TaskStatus,
        src_index: usize,
        dest_status: TaskStatus,
        dest_index: usize,
    ) -> MoveOutcome {
        if src_status == dest_status && src_index == dest_index {
            return MoveOutcome {
                board: self.clone(),
                updates: Vec::new(),
            };
        }
        if src_index >= self.column(src_status).len() {
            return MoveOutcome {
                board: self.clone(),
                updates: Vec::new(),
            };
        }

        let mut columns = self.columns.clone();

        let mut moved = match columns.get_mut(&src_status) {
            Some(column) => column.remove(src_index),
            None => {
                return MoveOutcome {
                    board: self.clone(),
                    updates: Vec::new(),
                }
            }
        };
        let moved_id = moved.id.clone();
        if src_status != dest_status {
            moved.status = dest_status;
        }

        let dest_column = columns.entry(dest_status).or_default();
        let dest_index = dest_index.min(dest_column.len());
        dest_column.insert(dest_index, moved);

        // The moved card is always persisted; its slot alone encodes the drop.
        let mut updates = vec![PositionUpdate {
            task_id: moved_id.clone(),
            status: dest_status,
            position: position_for(dest_index),
        }];

        for (index, task) in dest_column.iter_mut().enumerate() {
            let new_position = position_for(index);
            if task.id != moved_id && task.position != new_position {
                updates.push(PositionUpdate {
                    task_id: task.id.clone(),
                    status: dest_status,
                    position: new_position,
                });
            }
            task.position = new_position;
        }

        // Crossing columns leaves a gap in the source; close it.
        if src_status != dest_status {
            if let Some(src_column) = columns.get_mut(&src_status) {
                for (index, task) in src_column.iter_mut().enumerate() {
                    let new_position = position_for(index);
                    if task.position != new_position {
                        updates.push(PositionUpdate {
                            task_id: task.id.clone(),
                            status: src_status,
                            position: new_position,
                        });
                    }
                    task.position = new_position;
                }
            }
        }

        MoveOutcome {
            board: Board { columns },
            updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskPriority;
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

    fn column_ids(board: &Board, status: TaskStatus) -> Vec<&str> {
        board.column(status).iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn from_tasks_groups_and_orders_by_position() {
        let tasks = vec![
            task("late", TaskStatus::Todo, 3000),
            task("early", TaskStatus::Todo, 1000),
            task("doing", TaskStatus::InProgress, 1000),
        ];
        let board = Board::from_tasks(&tasks);
        assert_eq!(column_ids(&board, TaskStatus::Todo), vec!["early", "late"]);
        assert_eq!(column_ids(&board, TaskStatus::InProgress), vec!["doing"]);
        assert!(board.column(TaskStatus::Done).is_empty());
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn equal_positions_keep_insertion_order() {
        let tasks = vec![
            task("first", TaskStatus::Backlog, 1000),
            task("second", TaskStatus::Backlog, 1000),
            task("third", TaskStatus::Backlog, 1000),
        ];
        let board = Board::from_tasks(&tasks);
        assert_eq!(
            column_ids(&board, TaskStatus::Backlog),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn identity_move_is_a_noop() {
        let tasks = vec![
            task("a", TaskStatus::Todo, 1000),
            task("b", TaskStatus::Todo, 2000),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 1, TaskStatus::Todo, 1);
        assert!(out.updates.is_empty());
        assert_eq!(out.board, board);
    }

    #[test]
    fn out_of_range_source_is_a_noop() {
        let tasks = vec![task("a", TaskStatus::Todo, 1000)];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 5, TaskStatus::Done, 0);
        assert!(out.updates.is_empty());
        assert_eq!(out.board, board);

        // Empty source column behaves the same.
        let out = board.move_task(TaskStatus::InReview, 0, TaskStatus::Todo, 0);
        assert!(out.updates.is_empty());
        assert_eq!(out.board, board);
    }

    #[test]
    fn cross_column_move_updates_status_and_closes_gap() {
        let tasks = vec![
            task("a", TaskStatus::Todo, 1000),
            task("b", TaskStatus::Todo, 2000),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 0, TaskStatus::InProgress, 0);

        assert_eq!(column_ids(&out.board, TaskStatus::Todo), vec!["b"]);
        assert_eq!(column_ids(&out.board, TaskStatus::InProgress), vec!["a"]);

        let moved = &out.board.column(TaskStatus::InProgress)[0];
        assert_eq!(moved.status, TaskStatus::InProgress);
        assert_eq!(moved.position, 1000);
        assert_eq!(out.board.column(TaskStatus::Todo)[0].position, 1000);

        assert_eq!(
            out.updates,
            vec![
                PositionUpdate {
                    task_id: "a".into(),
                    status: TaskStatus::InProgress,
                    position: 1000,
                },
                PositionUpdate {
                    task_id: "b".into(),
                    status: TaskStatus::Todo,
                    position: 1000,
                },
            ]
        );
    }

    #[test]
    fn same_column_reorder_renumbers_shifted_cards() {
        let tasks = vec![
            task("a", TaskStatus::Todo, 1000),
            task("b", TaskStatus::Todo, 2000),
            task("c", TaskStatus::Todo, 3000),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 0, TaskStatus::Todo, 2);

        assert_eq!(column_ids(&out.board, TaskStatus::Todo), vec!["b", "c", "a"]);
        assert_eq!(
            out.updates,
            vec![
                PositionUpdate {
                    task_id: "a".into(),
                    status: TaskStatus::Todo,
                    position: 3000,
                },
                PositionUpdate {
                    task_id: "b".into(),
                    status: TaskStatus::Todo,
                    position: 1000,
                },
                PositionUpdate {
                    task_id: "c".into(),
                    status: TaskStatus::Todo,
                    position: 2000,
                },
            ]
        );
    }

    #[test]
    fn updates_are_minimal() {
        // Appending to the end of another column leaves the existing cards
        // of that column untouched.
        let tasks = vec![
            task("x", TaskStatus::Done, 1000),
            task("y", TaskStatus::Done, 2000),
            task("m", TaskStatus::Todo, 1000),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 0, TaskStatus::Done, 2);

        assert_eq!(column_ids(&out.board, TaskStatus::Done), vec!["x", "y", "m"]);
        assert_eq!(
            out.updates,
            vec![PositionUpdate {
                task_id: "m".into(),
                status: TaskStatus::Done,
                position: 3000,
            }]
        );
    }

    #[test]
    fn move_round_trip_restores_the_partition() {
        let tasks = vec![
            task("a", TaskStatus::Todo, 1000),
            task("b", TaskStatus::Todo, 2000),
            task("c", TaskStatus::Todo, 3000),
            task("d", TaskStatus::InReview, 1000),
            task("e", TaskStatus::InReview, 2000),
        ];
        let board = Board::from_tasks(&tasks);
        let there = board.move_task(TaskStatus::Todo, 1, TaskStatus::InReview, 0);
        let back = there.board.move_task(TaskStatus::InReview, 0, TaskStatus::Todo, 1);

        for status in TaskStatus::ALL {
            assert_eq!(column_ids(&back.board, status), column_ids(&board, status));
        }
    }

    #[test]
    fn positions_follow_the_stride_scheme_after_a_move() {
        let tasks = vec![
            task("a", TaskStatus::Backlog, 7),
            task("b", TaskStatus::Backlog, 42),
            task("c", TaskStatus::Backlog, 99),
            task("d", TaskStatus::Todo, 5),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 0, TaskStatus::Backlog, 1);

        for status in [TaskStatus::Backlog, TaskStatus::Todo] {
            let column = out.board.column(status);
            for (index, task) in column.iter().enumerate() {
                assert_eq!(task.position, position_for(index));
            }
            for pair in column.windows(2) {
                assert!(pair[0].position < pair[1].position);
            }
        }
    }

    #[test]
    fn destination_index_clamps_to_column_end() {
        let tasks = vec![
            task("a", TaskStatus::Todo, 1000),
            task("b", TaskStatus::InProgress, 1000),
        ];
        let board = Board::from_tasks(&tasks);
        let out = board.move_task(TaskStatus::Todo, 0, TaskStatus::InProgress, 99);
        assert_eq!(column_ids(&out.board, TaskStatus::InProgress), vec!["b", "a"]);
        assert_eq!(out.updates[0].position, 2000);
    }

    #[test]
    fn positions_cap_at_the_maximum() {
        assert_eq!(position_for(0), 1000);
        assert_eq!(position_for(998), 999_000);
        assert_eq!(position_for(999), POSITION_MAX);
        assert_eq!(position_for(5000), POSITION_MAX);
    }
}
