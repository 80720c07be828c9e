//! Application state

use std::sync::Arc;

use anyhow::Context;
use taskflow_core::task::FileTaskStore;

use crate::auth::AuthStore;
use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: FileTaskStore,
    auth_store: AuthStore,
}

impl AppState {
    /// Open the stores under the configured data directory
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let tasks_path = config.tasks_path();
        let task_store = FileTaskStore::new(&tasks_path)
            .await
            .with_context(|| format!("Failed to open task store at {:?}", tasks_path))?;
        let auth_store = AuthStore::new(
            config.auth_dir(),
            config.jwt_secret.clone(),
            config.token_ttl_seconds,
        )
        .await
        .context("Failed to open auth store")?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                task_store,
                auth_store,
            }),
        })
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &FileTaskStore {
        &self.inner.task_store
    }

    /// Get reference to the auth store
    pub fn auth_store(&self) -> &AuthStore {
        &self.inner.auth_store
    }
}
