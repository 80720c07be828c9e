//! Create and update payloads
//!
//! `TaskPatch` is the allow-list of fields a client may change on an
//! existing task. Anything outside it is rejected during deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::model::{
    due_date, sanitize_optional_string, validate_estimated_time, validate_title, Comment, Task,
    TaskPriority, TaskStatus,
};
use crate::Result;

/// Present-but-null becomes `Some(None)`, absent stays `None`
fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Fields accepted when creating a task. Server-managed fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "due_date::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Build a fresh task with a new id and timestamps
    pub fn into_task(self) -> Result<Task> {
        let mut task = Task::new(self.title);
        task.description = sanitize_optional_string(self.description);
        task.due_date = self.due_date;
        task.priority = self.priority.unwrap_or_default();
        task.category = sanitize_optional_string(self.category);
        task.assigned_to = sanitize_optional_string(self.assigned_to);
        task.estimated_time = self.estimated_time;
        task.status = self.status.unwrap_or_default();
        task.comments = self.comments;
        task.validate()?;
        Ok(task)
    }
}

/// Partial update of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "due_date::deserialize_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_time: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl TaskPatch {
    /// Patch that only changes the status
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch that replaces the comment sequence
    pub fn comments(comments: Vec<Comment>) -> Self {
        Self {
            comments: Some(comments),
            ..Self::default()
        }
    }

    /// Edit buffer seeded with every editable field of `task`.
    ///
    /// Comments are left out so saving an edit never rewrites them.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            due_date: Some(task.due_date),
            priority: Some(task.priority),
            category: Some(task.category.clone()),
            assigned_to: Some(task.assigned_to.clone()),
            estimated_time: Some(task.estimated_time),
            status: Some(task.status),
            comments: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(Some(hours)) = self.estimated_time {
            validate_estimated_time(hours)?;
        }
        if let Some(comments) = &self.comments {
            for comment in comments {
                comment.validate()?;
            }
        }
        Ok(())
    }

    /// Validate, then merge the present fields onto `task`.
    ///
    /// On error `task` is left untouched. Timestamps are not changed here;
    /// the store refreshes `updated_at` when it saves.
    pub fn apply(self, task: &mut Task) -> Result<()> {
        self.validate()?;

        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = sanitize_optional_string(description);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(category) = self.category {
            task.category = sanitize_optional_string(category);
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = sanitize_optional_string(assigned_to);
        }
        if let Some(estimated_time) = self.estimated_time {
            task.estimated_time = estimated_time;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(comments) = self.comments {
            task.comments = comments;
        }
        Ok(())
    }
}
