//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Task;
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task
    async fn create(&self, task: Task) -> Result<Task>;

    /// Get a task by ID
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Get all tasks, oldest first
    async fn list(&self) -> Result<Vec<Task>>;

    /// Replace an existing task, refreshing `updated_at`
    async fn update(&self, task: Task) -> Result<Task>;

    /// Delete a task by ID, returning whether it existed
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
