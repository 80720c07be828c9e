//! Task module
//!
//! This module contains task-related types and logic.

mod file_store;
mod model;
mod patch;
mod repository;

pub use file_store::FileTaskStore;
pub use model::*;
pub use patch::{NewTask, TaskPatch};
pub use repository::TaskRepository;
