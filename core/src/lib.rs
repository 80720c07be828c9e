//! Core library for Task Flow
//!
//! This crate contains the core business logic, including:
//! - Task and comment model
//! - Task storage
//! - The task list view-model (filtering, sorting, progress, reconciliation)

pub mod error;
pub mod task;
pub mod view;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
