//! Filter configuration

use std::fmt;
use std::str::FromStr;

use crate::task::{Task, TaskPriority, TaskStatus};
use crate::{Error, Result};

/// Filter value meaning "no constraint on this field"
pub const ALL: &str = "all";

/// Constraint on a single task field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> FieldFilter<T> {
    pub fn matches(&self, value: Option<&T>) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => value == Some(expected),
        }
    }
}

impl<T: FromStr> FieldFilter<T> {
    /// Parse a filter value, where `"all"` is the sentinel
    pub fn parse(raw: &str) -> std::result::Result<Self, T::Err> {
        if raw == ALL {
            Ok(Self::All)
        } else {
            raw.parse().map(Self::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for FieldFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Task fields that can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Status,
    Priority,
    Category,
    AssignedTo,
}

impl FilterField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Category => "category",
            Self::AssignedTo => "assignedTo",
        }
    }

    /// The task's value for this field as shown in filter menus
    pub fn value_of(self, task: &Task) -> Option<&str> {
        match self {
            Self::Status => Some(task.status.as_str()),
            Self::Priority => Some(task.priority.as_str()),
            Self::Category => task.category.as_deref(),
            Self::AssignedTo => task.assigned_to.as_deref(),
        }
    }
}

impl FromStr for FilterField {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "category" => Ok(Self::Category),
            "assignedTo" => Ok(Self::AssignedTo),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported filter field '{}'",
                value
            ))),
        }
    }
}

/// Active filters; a task is visible only if every filter matches
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilters {
    pub status: FieldFilter<TaskStatus>,
    pub priority: FieldFilter<TaskPriority>,
    pub category: FieldFilter<String>,
    pub assigned_to: FieldFilter<String>,
}

impl TaskFilters {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(Some(&task.status))
            && self.priority.matches(Some(&task.priority))
            && self.category.matches(task.category.as_ref())
            && self.assigned_to.matches(task.assigned_to.as_ref())
    }

    /// Set one filter from a raw menu value.
    ///
    /// Status and priority values outside their enums are rejected and
    /// leave the filters unchanged.
    pub fn set(&mut self, field: FilterField, raw: &str) -> Result<()> {
        match field {
            FilterField::Status => self.status = FieldFilter::parse(raw)?,
            FilterField::Priority => self.priority = FieldFilter::parse(raw)?,
            FilterField::Category => self.category = string_filter(raw),
            FilterField::AssignedTo => self.assigned_to = string_filter(raw),
        }
        Ok(())
    }

    /// Current raw value of one filter
    pub fn get(&self, field: FilterField) -> String {
        match field {
            FilterField::Status => self.status.to_string(),
            FilterField::Priority => self.priority.to_string(),
            FilterField::Category => self.category.to_string(),
            FilterField::AssignedTo => self.assigned_to.to_string(),
        }
    }
}

fn string_filter(raw: &str) -> FieldFilter<String> {
    if raw == ALL {
        FieldFilter::All
    } else {
        FieldFilter::Only(raw.to_string())
    }
}

/// `"all"` followed by the distinct non-empty values of `field`, in the
/// order they first appear in `tasks`
pub fn available_filter_values(tasks: &[Task], field: FilterField) -> Vec<String> {
    let mut values = vec![ALL.to_string()];
    for value in tasks.iter().filter_map(|task| field.value_of(task)) {
        if !value.is_empty() && !values.iter().any(|seen| seen == value) {
            values.push(value.to_string());
        }
    }
    values
}
