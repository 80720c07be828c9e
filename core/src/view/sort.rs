//! Visible task ordering

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

use super::filter::TaskFilters;
use crate::task::Task;

/// Sort order for the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Earliest due date first, undated tasks last
    #[default]
    DueDate,
    /// Urgent first, low last
    Priority,
    /// Lexicographic by status wire name
    Status,
    /// Keep collection order
    Unsorted,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueDate => "dueDate",
            Self::Priority => "priority",
            Self::Status => "status",
            Self::Unsorted => "none",
        }
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::DueDate => compare_due_dates(a.due_date, b.due_date),
            Self::Priority => a.priority.rank().cmp(&b.priority.rank()),
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::Unsorted => Ordering::Equal,
        }
    }
}

impl From<&str> for SortKey {
    /// Unknown keys fall back to `Unsorted`
    fn from(value: &str) -> Self {
        match value {
            "dueDate" => Self::DueDate,
            "priority" => Self::Priority,
            "status" => Self::Status,
            _ => Self::Unsorted,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compare_due_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Tasks passing `filters`, ordered by `sort`.
///
/// The sort is stable: ties keep their collection order.
pub fn compute_visible_tasks<'a>(
    tasks: &'a [Task],
    filters: &TaskFilters,
    sort: SortKey,
) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|task| filters.matches(task)).collect();
    if sort != SortKey::Unsorted {
        visible.sort_by(|a, b| sort.compare(a, b));
    }
    visible
}
