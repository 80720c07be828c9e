//! Folding confirmed server mutations into the local collection

use uuid::Uuid;

use crate::task::{Task, TaskPatch, TaskStatus};

/// A mutation the server has confirmed, carrying what it returned
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Server echoed the created task
    Created(Task),
    /// Server echoed the full task after merging the patch
    Updated(Task),
    /// Server confirmed deletion; only the id is known
    Deleted(Uuid),
}

impl Mutation {
    pub fn task_id(&self) -> Uuid {
        match self {
            Self::Created(task) | Self::Updated(task) => task.id,
            Self::Deleted(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied,
    /// The mutation targeted a task the local collection no longer has
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub tasks: Vec<Task>,
    pub outcome: ReconcileOutcome,
}

impl Reconciliation {
    fn applied(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            outcome: ReconcileOutcome::Applied,
        }
    }

    fn stale(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            outcome: ReconcileOutcome::Stale,
        }
    }
}

/// Apply a confirmed mutation to `tasks`.
///
/// Updates and deletes for unknown ids leave the collection unchanged and
/// report `Stale`. A created task whose id is already present replaces the
/// existing entry so ids stay unique.
pub fn reconcile_after_mutation(mut tasks: Vec<Task>, mutation: Mutation) -> Reconciliation {
    match mutation {
        Mutation::Created(task) => {
            match position_of(&tasks, task.id) {
                Some(index) => tasks[index] = task,
                None => tasks.push(task),
            }
            Reconciliation::applied(tasks)
        }
        Mutation::Updated(task) => match position_of(&tasks, task.id) {
            Some(index) => {
                tasks[index] = task;
                Reconciliation::applied(tasks)
            }
            None => Reconciliation::stale(tasks),
        },
        Mutation::Deleted(id) => match position_of(&tasks, id) {
            Some(index) => {
                tasks.remove(index);
                Reconciliation::applied(tasks)
            }
            None => Reconciliation::stale(tasks),
        },
    }
}

fn position_of(tasks: &[Task], id: Uuid) -> Option<usize> {
    tasks.iter().position(|task| task.id == id)
}

/// Patch that flips a task between completed and todo
pub fn toggle_completion(task: &Task) -> TaskPatch {
    let status = if task.status == TaskStatus::Completed {
        TaskStatus::Todo
    } else {
        TaskStatus::Completed
    };
    TaskPatch::status(status)
}
