//! Task filtering, statistics, and sorting.
//!
//! The filter engine is a pure function over an in-memory task slice: it
//! applies a [`FilterSpec`] (logical AND across dimensions, OR within a
//! multi-select dimension) and reports count statistics for the result.
//! Filtering is stable: the output preserves the relative order of the
//! input. A partially-filled or empty spec simply constrains less; it is
//! never an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::fields::*;
use crate::task::Task;

/// Active filter criteria for narrowing a task list.
///
/// Every field defaults to "no constraint". Owned by one view at a time and
/// mutated incrementally as the user toggles criteria; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Statuses to include. Empty means all statuses pass.
    pub status: Vec<TaskStatus>,
    /// Priorities to include. Empty means all priorities pass.
    pub priority: Vec<TaskPriority>,
    /// Case-insensitive substring matched against title, description, and
    /// project name. Empty means no text constraint.
    pub search_term: String,
    /// Inclusive lower bound on the due date.
    pub due_start: Option<NaiveDate>,
    /// Inclusive upper bound on the due date.
    pub due_end: Option<NaiveDate>,
    /// Restrict to a single project.
    pub project_id: Option<String>,
    /// Restrict to a single workspace.
    pub workspace_id: Option<String>,
}

impl FilterSpec {
    /// True if at least one criterion is set.
    pub fn is_active(&self) -> bool {
        !self.status.is_empty()
            || !self.priority.is_empty()
            || !self.search_term.is_empty()
            || self.due_start.is_some()
            || self.due_end.is_some()
            || self.project_id.is_some()
            || self.workspace_id.is_some()
    }

    /// Reset every criterion to its default.
    pub fn clear(&mut self) {
        *self = FilterSpec::default();
    }

    /// Whether a single task passes every active criterion.
    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.is_empty() && !self.status.contains(&task.status) {
            return false;
        }
        if !self.priority.is_empty() && !self.priority.contains(&task.priority) {
            return false;
        }
        if !self.search_term.is_empty() {
            let term = self.search_term.to_lowercase();
            let title_match = task.title.to_lowercase().contains(&term);
            let desc_match = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term));
            let project_match = task.project.name.to_lowercase().contains(&term);
            if !title_match && !desc_match && !project_match {
                return false;
            }
        }
        if self.due_start.is_some() || self.due_end.is_some() {
            // Any bound on the range requires the task to carry a due date.
            let Some(due) = task.due else {
                return false;
            };
            if let Some(start) = self.due_start {
                if due < start {
                    return false;
                }
            }
            if let Some(end) = self.due_end {
                if due > end {
                    return false;
                }
            }
        }
        if let Some(ref pid) = self.project_id {
            if task.project.id != *pid {
                return false;
            }
        }
        if let Some(ref wid) = self.workspace_id {
            if task.project.workspace_id != *wid {
                return false;
            }
        }
        true
    }
}

/// Count statistics for a filter pass.
///
/// The breakdowns cover the *filtered* set and always carry every enum key,
/// defaulting to zero, so consumers can index without missing-key checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStats {
    pub total: usize,
    pub filtered: usize,
    pub by_status: BTreeMap<TaskStatus, usize>,
    pub by_priority: BTreeMap<TaskPriority, usize>,
}

impl FilterStats {
    fn tally<'a, I: IntoIterator<Item = &'a Task>>(total: usize, filtered: I) -> Self {
        let mut by_status: BTreeMap<TaskStatus, usize> =
            TaskStatus::ALL.iter().map(|&s| (s, 0)).collect();
        let mut by_priority: BTreeMap<TaskPriority, usize> =
            TaskPriority::ALL.iter().map(|&p| (p, 0)).collect();
        let mut count = 0;
        for task in filtered {
            count += 1;
            *by_status.entry(task.status).or_default() += 1;
            *by_priority.entry(task.priority).or_default() += 1;
        }
        FilterStats {
            total,
            filtered: count,
            by_status,
            by_priority,
        }
    }
}

/// Result of one filter pass: the surviving tasks plus statistics.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub filtered: Vec<&'a Task>,
    pub stats: FilterStats,
}

/// Apply a filter spec to a task slice.
///
/// Stable: the output is a subsequence of the input. Pure: neither the tasks
/// nor the spec are modified, and the same inputs always produce the same
/// outcome.
pub fn filter_tasks<'a>(tasks: &'a [Task], spec: &FilterSpec) -> FilterOutcome<'a> {
    let filtered: Vec<&Task> = tasks.iter().filter(|t| spec.matches(t)).collect();
    let stats = FilterStats::tally(tasks.len(), filtered.iter().copied());
    FilterOutcome { filtered, stats }
}

/// Sort a filtered view in place.
///
/// Tasks with no due date sort after dated ones ascending and before them
/// descending. Ties are broken by id so repeated sorts are deterministic.
pub fn sort_tasks(tasks: &mut [&Task], key: SortKey, dir: SortDir) {
    tasks.sort_by(|a, b| {
        let ord = match key {
            SortKey::Due => a
                .due
                .unwrap_or(NaiveDate::MAX)
                .cmp(&b.due.unwrap_or(NaiveDate::MAX)),
            SortKey::Priority => a.priority.cmp(&b.priority),
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::Created => a.created_at_utc.cmp(&b.created_at_utc),
            SortKey::Updated => a.updated_at_utc.cmp(&b.updated_at_utc),
            SortKey::Title => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
        };
        let ord = ord.then_with(|| a.id.cmp(&b.id));
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ProjectRef;

    fn project() -> ProjectRef {
        ProjectRef {
            id: "proj-1".into(),
            name: "Website Redesign".into(),
            workspace_id: "ws-1".into(),
            workspace_name: "Acme".into(),
        }
    }

    fn task(id: &str, status: TaskStatus, priority: TaskPriority) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            status,
            priority,
            due: None,
            position: 1000,
            project: project(),
            assignee: None,
            creator_id: "user-1".into(),
            created_at_utc: 1_700_000_000,
            updated_at_utc: 1_700_000_000,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            task("a", TaskStatus::Backlog, TaskPriority::Low),
            task("b", TaskStatus::Todo, TaskPriority::Medium),
            task("c", TaskStatus::Todo, TaskPriority::High),
            task("d", TaskStatus::InProgress, TaskPriority::Urgent),
            task("e", TaskStatus::Done, TaskPriority::Low),
        ]
    }

    fn ids<'a>(filtered: &[&'a Task]) -> Vec<&'a str> {
        filtered.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn empty_spec_is_identity() {
        let tasks = sample();
        let spec = FilterSpec::default();
        assert!(!spec.is_active());
        let out = filter_tasks(&tasks, &spec);
        assert_eq!(ids(&out.filtered), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(out.stats.total, 5);
        assert_eq!(out.stats.filtered, 5);
    }

    #[test]
    fn status_filter_is_or_within_dimension() {
        let tasks = sample();
        let spec = FilterSpec {
            status: vec![TaskStatus::Todo, TaskStatus::Done],
            ..FilterSpec::default()
        };
        assert!(spec.is_active());
        let out = filter_tasks(&tasks, &spec);
        assert_eq!(ids(&out.filtered), vec!["b", "c", "e"]);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let tasks = sample();
        let spec = FilterSpec {
            status: vec![TaskStatus::Todo],
            priority: vec![TaskPriority::High],
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec).filtered), vec!["c"]);
    }

    #[test]
    fn priority_filter_counts_match_breakdown() {
        let mut tasks = sample();
        tasks.extend(sample().into_iter().map(|mut t| {
            t.id.push('2');
            t
        }));
        let spec = FilterSpec {
            priority: vec![TaskPriority::High, TaskPriority::Urgent],
            ..FilterSpec::default()
        };
        let out = filter_tasks(&tasks, &spec);
        assert_eq!(out.filtered.len(), 4);
        let high = out.stats.by_priority[&TaskPriority::High];
        let urgent = out.stats.by_priority[&TaskPriority::Urgent];
        assert_eq!(high + urgent, 4);
    }

    #[test]
    fn search_covers_title_description_and_project() {
        let mut tasks = sample();
        tasks[0].title = "Fix login BUG".into();
        tasks[1].description = Some("regression bug in parser".into());
        // tasks[2..] match via the project name "Website Redesign".
        let spec = FilterSpec {
            search_term: "bug".into(),
            ..FilterSpec::default()
        };
        let out = filter_tasks(&tasks, &spec);
        assert_eq!(ids(&out.filtered), vec!["a", "b"]);

        let spec = FilterSpec {
            search_term: "REDESIGN".into(),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec).filtered.len(), 5);
    }

    #[test]
    fn missing_description_never_matches_search() {
        let tasks = vec![task("a", TaskStatus::Todo, TaskPriority::Low)];
        let spec = FilterSpec {
            search_term: "zzz-no-match".into(),
            ..FilterSpec::default()
        };
        let out = filter_tasks(&tasks, &spec);
        assert!(out.filtered.is_empty());
        assert_eq!(out.stats.filtered, 0);
        assert_eq!(out.stats.total, 1);
    }

    #[test]
    fn due_range_requires_a_due_date() {
        let mut tasks = sample();
        tasks[1].due = Some(date(2026, 3, 10));
        tasks[2].due = Some(date(2026, 3, 20));
        let spec = FilterSpec {
            due_start: Some(date(2026, 3, 1)),
            ..FilterSpec::default()
        };
        // Tasks without a due date drop out as soon as any bound is set.
        assert_eq!(ids(&filter_tasks(&tasks, &spec).filtered), vec!["b", "c"]);

        let spec = FilterSpec {
            due_start: Some(date(2026, 3, 10)),
            due_end: Some(date(2026, 3, 10)),
            ..FilterSpec::default()
        };
        // Bounds are inclusive.
        assert_eq!(ids(&filter_tasks(&tasks, &spec).filtered), vec!["b"]);

        let spec = FilterSpec {
            due_end: Some(date(2026, 3, 15)),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec).filtered), vec!["b"]);
    }

    #[test]
    fn project_and_workspace_scoping() {
        let mut tasks = sample();
        tasks[3].project.id = "proj-2".into();
        tasks[3].project.workspace_id = "ws-2".into();
        let spec = FilterSpec {
            project_id: Some("proj-2".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec).filtered), vec!["d"]);

        let spec = FilterSpec {
            workspace_id: Some("ws-1".into()),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &spec).filtered.len(), 4);
    }

    #[test]
    fn filtering_is_stable_and_idempotent() {
        let tasks = sample();
        let spec = FilterSpec {
            priority: vec![TaskPriority::Low],
            ..FilterSpec::default()
        };
        let first = filter_tasks(&tasks, &spec);
        assert_eq!(ids(&first.filtered), vec!["a", "e"]);

        let refiltered: Vec<Task> = first.filtered.iter().map(|t| (*t).clone()).collect();
        let second = filter_tasks(&refiltered, &spec);
        assert_eq!(ids(&second.filtered), ids(&first.filtered));
        assert_eq!(second.stats.total, first.stats.filtered);
    }

    #[test]
    fn stats_carry_every_enum_key() {
        let tasks = sample();
        let out = filter_tasks(
            &tasks,
            &FilterSpec {
                status: vec![TaskStatus::Todo],
                ..FilterSpec::default()
            },
        );
        assert_eq!(out.stats.by_status.len(), 5);
        assert_eq!(out.stats.by_priority.len(), 4);
        let status_sum: usize = out.stats.by_status.values().sum();
        assert_eq!(status_sum, out.stats.filtered);
        assert_eq!(out.stats.by_status[&TaskStatus::Done], 0);
    }

    #[test]
    fn clear_resets_to_inactive() {
        let mut spec = FilterSpec {
            search_term: "x".into(),
            due_end: Some(date(2026, 1, 1)),
            ..FilterSpec::default()
        };
        assert!(spec.is_active());
        spec.clear();
        assert!(!spec.is_active());
    }

    #[test]
    fn sort_by_due_places_undated_last_ascending() {
        let mut tasks = sample();
        tasks[0].due = Some(date(2026, 5, 1));
        tasks[2].due = Some(date(2026, 4, 1));
        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut view, SortKey::Due, SortDir::Asc);
        assert_eq!(ids(&view), vec!["c", "a", "b", "d", "e"]);

        sort_tasks(&mut view, SortKey::Due, SortDir::Desc);
        assert_eq!(ids(&view), vec!["e", "d", "b", "a", "c"]);
    }

    #[test]
    fn sort_by_priority_uses_declared_order() {
        let tasks = sample();
        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut view, SortKey::Priority, SortDir::Desc);
        assert_eq!(ids(&view), vec!["d", "c", "b", "e", "a"]);
    }

    #[test]
    fn sort_by_title_is_case_insensitive() {
        let mut tasks = sample();
        tasks[0].title = "beta".into();
        tasks[1].title = "Alpha".into();
        tasks[2].title = "gamma".into();
        tasks[3].title = "DELTA".into();
        tasks[4].title = "epsilon".into();
        let mut view: Vec<&Task> = tasks.iter().collect();
        sort_tasks(&mut view, SortKey::Title, SortDir::Asc);
        assert_eq!(ids(&view), vec!["b", "a", "d", "e", "c"]);
    }
}
