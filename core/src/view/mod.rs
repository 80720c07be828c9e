//! Task list view-model
//!
//! Pure derivations over an in-memory task collection: which tasks are
//! visible under the current filters and in what order, how far along each
//! one is, which filter values are on offer, and how a confirmed server
//! mutation folds back into the local collection.

mod filter;
mod reconcile;
mod sort;

pub use filter::{available_filter_values, FieldFilter, FilterField, TaskFilters, ALL};
pub use reconcile::{
    reconcile_after_mutation, toggle_completion, Mutation, ReconcileOutcome, Reconciliation,
};
pub use sort::{compute_visible_tasks, SortKey};

use crate::task::{Task, TaskStatus};

/// Progress percentage shown for a task
pub fn compute_progress(task: &Task) -> u8 {
    task.status.progress()
}

/// Progress for a raw status string; anything unrecognized counts as 0
pub fn progress_for(status: &str) -> u8 {
    status
        .parse::<TaskStatus>()
        .map(TaskStatus::progress)
        .unwrap_or(0)
}

pub fn format_due_date(task: &Task) -> String {
    match task.due_date {
        Some(due) => due.date_naive().format("%Y-%m-%d").to_string(),
        None => "Not set".to_string(),
    }
}

pub fn format_estimated_time(task: &Task) -> String {
    match task.estimated_time {
        Some(hours) if hours > 0.0 => format!("{} hours", hours),
        _ => "Not set".to_string(),
    }
}

pub fn assignee_label(task: &Task) -> &str {
    task.assigned_to.as_deref().unwrap_or("Unassigned")
}
