//! Task Flow client
//!
//! HTTP clients for the task and auth endpoints, the session holder, and the
//! `TaskBoard` controller that keeps the task list view-model in step with
//! the server.

mod api;
mod app;
mod auth;
mod board;
mod config;
mod error;

pub use api::{HttpTaskApi, TaskApi};
pub use app::TaskApp;
pub use auth::{AuthApi, AuthClient, AuthSession, SessionStore, User};
pub use board::{BoardAction, BoardEvent, TaskBoard};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
