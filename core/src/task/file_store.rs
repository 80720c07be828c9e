//! JSON document store for tasks
//!
//! The whole collection lives in memory and is rewritten to disk, ordered
//! by creation time, after every mutation. A mutation is applied to a copy
//! of the collection and only becomes visible once the document is on disk.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::Task;
use super::repository::TaskRepository;
use crate::{Error, Result};

pub struct FileTaskStore {
    path: PathBuf,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl FileTaskStore {
    /// Open the store at `path`. A missing or blank file is an empty store;
    /// the file is created on the first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tasks = read_document(&path).await?;
        tracing::debug!("Loaded {} tasks from {:?}", tasks.len(), path);

        Ok(Self {
            path,
            tasks: RwLock::new(tasks),
        })
    }

    /// Rewrite the document. Callers hold the write guard so the file never
    /// lags behind a later mutation.
    async fn write_document(&self, tasks: &HashMap<Uuid, Task>) -> Result<()> {
        let document = serde_json::to_string_pretty(&in_creation_order(tasks))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_document(&path, document.as_bytes()))
            .await
            .map_err(|err| Error::Storage(format!("Task document write aborted: {}", err)))?
    }

    /// Persist `next` and publish it in place of the guarded collection
    async fn commit(
        &self,
        tasks: &mut HashMap<Uuid, Task>,
        next: HashMap<Uuid, Task>,
    ) -> Result<()> {
        self.write_document(&next).await?;
        *tasks = next;
        Ok(())
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers see
/// either the old document or the new one.
fn replace_document(path: &Path, document: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(document)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| err.error)?;
    Ok(())
}

async fn read_document(path: &Path) -> Result<HashMap<Uuid, Task>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = tokio::fs::read_to_string(path).await?;
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let tasks: Vec<Task> = serde_json::from_str(&raw)
        .map_err(|err| Error::Storage(format!("Corrupt task document {:?}: {}", path, err)))?;
    Ok(tasks.into_iter().map(|task| (task.id, task)).collect())
}

/// Oldest first; ids break ties so the order is total
fn in_creation_order(tasks: &HashMap<Uuid, Task>) -> Vec<&Task> {
    let mut ordered: Vec<&Task> = tasks.values().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    ordered
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn create(&self, task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(Error::InvalidInput(format!(
                "Task {} already exists",
                task.id
            )));
        }
        let mut next = tasks.clone();
        next.insert(task.id, task.clone());
        self.commit(&mut tasks, next).await?;
        tracing::info!("Created task {}", task.id);
        Ok(task)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(in_creation_order(&tasks).into_iter().cloned().collect())
    }

    async fn update(&self, mut task: Task) -> Result<Task> {
        let mut tasks = self.tasks.write().await;
        let stored = tasks
            .get(&task.id)
            .ok_or_else(|| Error::TaskNotFound(task.id.to_string()))?;

        // created_at belongs to the stored record; updated_at never moves back
        task.created_at = stored.created_at;
        task.updated_at = task.updated_at.max(stored.updated_at);
        task.touch();

        let mut next = tasks.clone();
        next.insert(task.id, task.clone());
        self.commit(&mut tasks, next).await?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tasks = self.tasks.write().await;
        let mut next = tasks.clone();
        if next.remove(&id).is_none() {
            return Ok(false);
        }
        self.commit(&mut tasks, next).await?;
        tracing::info!("Deleted task {}", id);
        Ok(true)
    }
}
