//! Task board controller
//!
//! Holds the task collection plus view state (filters, sort, edit buffers,
//! comment drafts) and drives the Task API. Local state only changes after
//! the server confirms a mutation, using that mutation's own response.

use std::collections::HashMap;
use std::fmt;

use taskflow_core::task::{Comment, NewTask, Task, TaskPatch};
use taskflow_core::view::{
    self, available_filter_values, compute_visible_tasks, reconcile_after_mutation, FilterField,
    Mutation, ReconcileOutcome, SortKey, TaskFilters,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::TaskApi;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardAction {
    Load,
    Create,
    Update,
    Delete,
    Comment,
}

impl fmt::Display for BoardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Notifications published as the board changes
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Loaded { count: usize },
    Created(Task),
    Updated(Task),
    Deleted(Uuid),
    /// The server answered for a task this board no longer holds, or the
    /// server no longer has a task this board still shows
    Stale(Uuid),
    Failed { action: BoardAction, message: String },
}

pub struct TaskBoard<A> {
    api: A,
    author: String,
    tasks: Vec<Task>,
    filters: TaskFilters,
    sort: SortKey,
    editing: HashMap<Uuid, TaskPatch>,
    comment_drafts: HashMap<Uuid, String>,
    events: mpsc::UnboundedSender<BoardEvent>,
}

impl<A: TaskApi> TaskBoard<A> {
    /// Create an empty board. `author` is stamped on submitted comments.
    pub fn new(api: A, author: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<BoardEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let board = Self {
            api,
            author: author.into(),
            tasks: Vec::new(),
            filters: TaskFilters::default(),
            sort: SortKey::default(),
            editing: HashMap::new(),
            comment_drafts: HashMap::new(),
            events,
        };
        (board, rx)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn filters(&self) -> &TaskFilters {
        &self.filters
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    fn publish(&self, event: BoardEvent) {
        // A dropped receiver only means nobody is listening.
        let _ = self.events.send(event);
    }

    fn fail(&self, action: BoardAction, err: ClientError) -> ClientError {
        if err.is_transport() {
            warn!("Task {} failed: {}", action, err);
        } else {
            debug!("Task {} rejected: {}", action, err);
        }
        self.publish(BoardEvent::Failed {
            action,
            message: err.to_string(),
        });
        err
    }

    fn reconcile(&mut self, mutation: Mutation) -> ReconcileOutcome {
        let id = mutation.task_id();
        let tasks = std::mem::take(&mut self.tasks);
        let result = reconcile_after_mutation(tasks, mutation);
        self.tasks = result.tasks;
        if result.outcome == ReconcileOutcome::Stale {
            warn!("Reconciliation for task {} found no local entry", id);
            self.publish(BoardEvent::Stale(id));
        }
        result.outcome
    }

    /// Replace the collection with the server's
    pub async fn load(&mut self) -> Result<usize> {
        let tasks = self
            .api
            .list()
            .await
            .map_err(|err| self.fail(BoardAction::Load, err))?;

        self.editing.retain(|id, _| tasks.iter().any(|task| task.id == *id));
        self.comment_drafts
            .retain(|id, _| tasks.iter().any(|task| task.id == *id));
        self.tasks = tasks;

        let count = self.tasks.len();
        self.publish(BoardEvent::Loaded { count });
        Ok(count)
    }

    pub async fn create(&mut self, new_task: NewTask) -> Result<Task> {
        new_task
            .clone()
            .into_task()
            .map_err(|err| self.fail(BoardAction::Create, err.into()))?;

        let created = self
            .api
            .create(&new_task)
            .await
            .map_err(|err| self.fail(BoardAction::Create, err))?;

        self.reconcile(Mutation::Created(created.clone()));
        self.publish(BoardEvent::Created(created.clone()));
        Ok(created)
    }

    pub async fn update(&mut self, id: Uuid, patch: TaskPatch) -> Result<Task> {
        self.send_update(BoardAction::Update, id, patch).await
    }

    async fn send_update(
        &mut self,
        action: BoardAction,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task> {
        patch.validate().map_err(|err| self.fail(action, err.into()))?;
        if patch.is_empty() {
            return Err(self.fail(action, ClientError::validation("Nothing to update")));
        }

        let updated = match self.api.update(id, &patch).await {
            Ok(task) => task,
            Err(err) if err.is_not_found() => {
                self.publish(BoardEvent::Stale(id));
                return Err(self.fail(action, err));
            }
            Err(err) => return Err(self.fail(action, err)),
        };

        if self.reconcile(Mutation::Updated(updated.clone())) == ReconcileOutcome::Applied {
            self.publish(BoardEvent::Updated(updated.clone()));
        }
        Ok(updated)
    }

    /// Flip between completed and todo
    pub async fn toggle_completion(&mut self, id: Uuid) -> Result<Task> {
        let patch = match self.task(id) {
            Some(task) => view::toggle_completion(task),
            None => {
                let err = ClientError::NotFound {
                    message: format!("Task {} is not on the board", id),
                };
                return Err(self.fail(BoardAction::Update, err));
            }
        };
        self.send_update(BoardAction::Update, id, patch).await
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<()> {
        match self.api.delete(id).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                self.publish(BoardEvent::Stale(id));
                return Err(self.fail(BoardAction::Delete, err));
            }
            Err(err) => return Err(self.fail(BoardAction::Delete, err)),
        }

        self.editing.remove(&id);
        self.comment_drafts.remove(&id);
        if self.reconcile(Mutation::Deleted(id)) == ReconcileOutcome::Applied {
            self.publish(BoardEvent::Deleted(id));
        }
        Ok(())
    }

    /// Open an edit buffer seeded from the task. Returns false if the task
    /// is not on the board.
    pub fn start_edit(&mut self, id: Uuid) -> bool {
        let Some(task) = self.task(id) else {
            return false;
        };
        let buffer = TaskPatch::from_task(task);
        self.editing.insert(id, buffer);
        true
    }

    pub fn is_editing(&self, id: Uuid) -> bool {
        self.editing.contains_key(&id)
    }

    pub fn edit_buffer_mut(&mut self, id: Uuid) -> Option<&mut TaskPatch> {
        self.editing.get_mut(&id)
    }

    pub fn cancel_edit(&mut self, id: Uuid) {
        self.editing.remove(&id);
    }

    /// Send the edit buffer. The buffer is kept when the update fails.
    pub async fn save_edit(&mut self, id: Uuid) -> Result<Task> {
        let Some(patch) = self.editing.get(&id).cloned() else {
            let err = ClientError::validation(format!("Task {} is not being edited", id));
            return Err(self.fail(BoardAction::Update, err));
        };
        let updated = self.send_update(BoardAction::Update, id, patch).await?;
        self.editing.remove(&id);
        Ok(updated)
    }

    pub fn set_comment_draft(&mut self, id: Uuid, draft: impl Into<String>) {
        self.comment_drafts.insert(id, draft.into());
    }

    pub fn comment_draft(&self, id: Uuid) -> &str {
        self.comment_drafts.get(&id).map(String::as_str).unwrap_or("")
    }

    /// Append the draft as a comment. Blank drafts send nothing and return
    /// `Ok(None)`. The draft is cleared only after the server confirms.
    pub async fn submit_comment(&mut self, id: Uuid) -> Result<Option<Task>> {
        let content = self.comment_draft(id).trim().to_string();
        if content.is_empty() {
            return Ok(None);
        }

        let mut comments = match self.task(id) {
            Some(task) => task.comments.clone(),
            None => {
                let err = ClientError::NotFound {
                    message: format!("Task {} is not on the board", id),
                };
                return Err(self.fail(BoardAction::Comment, err));
            }
        };
        comments.push(Comment::new(content, self.author.clone()));

        let updated = self
            .send_update(BoardAction::Comment, id, TaskPatch::comments(comments))
            .await?;
        self.comment_drafts.remove(&id);
        Ok(Some(updated))
    }

    pub fn set_filter(&mut self, field: FilterField, value: &str) -> Result<()> {
        self.filters.set(field, value).map_err(ClientError::from)
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        compute_visible_tasks(&self.tasks, &self.filters, self.sort)
    }

    pub fn filter_options(&self, field: FilterField) -> Vec<String> {
        available_filter_values(&self.tasks, field)
    }

    pub fn progress(&self, id: Uuid) -> Option<u8> {
        self.task(id).map(view::compute_progress)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use taskflow_core::task::{TaskPriority, TaskStatus};

    use super::*;

    /// In-memory server with switchable failure
    #[derive(Clone, Default)]
    pub(crate) struct FakeApi {
        store: Arc<Mutex<Vec<Task>>>,
        offline: Arc<Mutex<bool>>,
        pub(crate) requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeApi {
        pub(crate) fn with_tasks(tasks: Vec<Task>) -> Self {
            let api = Self::default();
            *api.store.lock().unwrap() = tasks;
            api
        }

        fn set_offline(&self, offline: bool) {
            *self.offline.lock().unwrap() = offline;
        }

        fn remove_on_server(&self, id: Uuid) {
            self.store.lock().unwrap().retain(|task| task.id != id);
        }

        fn record(&self, request: String) -> Result<()> {
            self.requests.lock().unwrap().push(request);
            if *self.offline.lock().unwrap() {
                return Err(ClientError::transport("connection refused"));
            }
            Ok(())
        }

        fn not_found(id: Uuid) -> ClientError {
            ClientError::NotFound {
                message: format!("Task {} not found", id),
            }
        }
    }

    #[async_trait]
    impl TaskApi for FakeApi {
        async fn list(&self) -> Result<Vec<Task>> {
            self.record("GET /tasks".to_string())?;
            Ok(self.store.lock().unwrap().clone())
        }

        async fn create(&self, task: &NewTask) -> Result<Task> {
            self.record("POST /tasks".to_string())?;
            let task = task.clone().into_task()?;
            self.store.lock().unwrap().push(task.clone());
            Ok(task)
        }

        async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task> {
            self.record(format!("PATCH /tasks/{}", id))?;
            let mut store = self.store.lock().unwrap();
            let task = store
                .iter_mut()
                .find(|task| task.id == id)
                .ok_or_else(|| Self::not_found(id))?;
            patch.clone().apply(task)?;
            task.touch();
            Ok(task.clone())
        }

        async fn delete(&self, id: Uuid) -> Result<()> {
            self.record(format!("DELETE /tasks/{}", id))?;
            let mut store = self.store.lock().unwrap();
            let before = store.len();
            store.retain(|task| task.id != id);
            if store.len() == before {
                return Err(Self::not_found(id));
            }
            Ok(())
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<BoardEvent>) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    async fn loaded_board(
        tasks: Vec<Task>,
    ) -> (TaskBoard<FakeApi>, FakeApi, mpsc::UnboundedReceiver<BoardEvent>) {
        let api = FakeApi::with_tasks(tasks);
        let (mut board, mut rx) = TaskBoard::new(api.clone(), "tester");
        board.load().await.unwrap();
        drain(&mut rx);
        (board, api, rx)
    }

    #[tokio::test]
    async fn test_load_publishes_count() {
        let api = FakeApi::with_tasks(vec![Task::new("a"), Task::new("b")]);
        let (mut board, mut rx) = TaskBoard::new(api, "tester");
        assert_eq!(board.load().await.unwrap(), 2);
        assert_eq!(drain(&mut rx), vec![BoardEvent::Loaded { count: 2 }]);
    }

    #[tokio::test]
    async fn test_create_appends_server_task() {
        let (mut board, _api, mut rx) = loaded_board(vec![Task::new("a")]).await;
        let created = board.create(NewTask::new("b")).await.unwrap();

        assert_eq!(board.tasks().len(), 2);
        assert_eq!(board.tasks()[1], created);
        assert_eq!(drain(&mut rx), vec![BoardEvent::Created(created)]);
    }

    #[tokio::test]
    async fn test_create_without_title_sends_nothing() {
        let (mut board, api, mut rx) = loaded_board(vec![]).await;
        let err = board.create(NewTask::new("  ")).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation { .. }));
        assert_eq!(api.requests.lock().unwrap().len(), 1);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [BoardEvent::Failed { action: BoardAction::Create, .. }]
        ));
    }

    #[tokio::test]
    async fn test_failure_leaves_state_unchanged() {
        let task = Task::new("a");
        let id = task.id;
        let (mut board, api, mut rx) = loaded_board(vec![task]).await;
        let before = board.tasks().to_vec();
        api.set_offline(true);

        assert!(board.toggle_completion(id).await.unwrap_err().is_transport());
        assert!(board.delete(id).await.is_err());
        assert!(board.create(NewTask::new("b")).await.is_err());
        assert!(board.load().await.is_err());

        assert_eq!(board.tasks(), before.as_slice());
        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(events
            .iter()
            .all(|event| matches!(event, BoardEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_toggle_completion_round_trip() {
        let task = Task::new("a");
        let id = task.id;
        let (mut board, _api, _rx) = loaded_board(vec![task]).await;

        let done = board.toggle_completion(id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(board.progress(id), Some(100));

        let reopened = board.toggle_completion(id).await.unwrap();
        assert_eq!(reopened.status, TaskStatus::Todo);
        assert_eq!(board.progress(id), Some(0));
    }

    #[tokio::test]
    async fn test_update_of_task_deleted_elsewhere_is_stale() {
        let task = Task::new("a");
        let id = task.id;
        let (mut board, api, mut rx) = loaded_board(vec![task]).await;
        api.remove_on_server(id);

        let err = board
            .update(id, TaskPatch::status(TaskStatus::Review))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(board.tasks().len(), 1);

        let events = drain(&mut rx);
        assert_eq!(events[0], BoardEvent::Stale(id));
        assert!(matches!(events[1], BoardEvent::Failed { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_task_and_buffers() {
        let (a, b) = (Task::new("a"), Task::new("b"));
        let id = a.id;
        let (mut board, _api, mut rx) = loaded_board(vec![a, b.clone()]).await;
        board.start_edit(id);
        board.set_comment_draft(id, "draft");

        board.delete(id).await.unwrap();
        assert_eq!(board.tasks(), &[b][..]);
        assert!(!board.is_editing(id));
        assert_eq!(board.comment_draft(id), "");
        assert_eq!(drain(&mut rx), vec![BoardEvent::Deleted(id)]);
    }

    #[tokio::test]
    async fn test_edit_buffer_lifecycle() {
        let task = Task::new("draft title");
        let id = task.id;
        let (mut board, api, _rx) = loaded_board(vec![task]).await;

        assert!(!board.start_edit(Uuid::new_v4()));
        assert!(board.start_edit(id));
        if let Some(buffer) = board.edit_buffer_mut(id) {
            buffer.title = Some("final title".to_string());
            buffer.priority = Some(TaskPriority::Urgent);
        }

        api.set_offline(true);
        assert!(board.save_edit(id).await.is_err());
        assert!(board.is_editing(id));
        assert_eq!(board.task(id).unwrap().title, "draft title");

        api.set_offline(false);
        let saved = board.save_edit(id).await.unwrap();
        assert_eq!(saved.title, "final title");
        assert_eq!(saved.priority, TaskPriority::Urgent);
        assert!(!board.is_editing(id));
        assert_eq!(board.task(id), Some(&saved));

        board.start_edit(id);
        board.cancel_edit(id);
        assert!(!board.is_editing(id));
    }

    #[tokio::test]
    async fn test_submit_comment_appends_in_order() {
        let task = Task::new("a");
        let id = task.id;
        let (mut board, api, _rx) = loaded_board(vec![task]).await;

        board.set_comment_draft(id, "   ");
        assert_eq!(board.submit_comment(id).await.unwrap(), None);
        assert_eq!(api.requests.lock().unwrap().len(), 1);

        board.set_comment_draft(id, "first");
        board.submit_comment(id).await.unwrap();
        board.set_comment_draft(id, " second ");
        let updated = board.submit_comment(id).await.unwrap().unwrap();

        let contents: Vec<&str> = updated
            .comments
            .iter()
            .map(|comment| comment.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert!(updated.comments.iter().all(|c| c.author == "tester"));
        assert_eq!(board.comment_draft(id), "");
    }

    #[tokio::test]
    async fn test_failed_comment_keeps_draft() {
        let task = Task::new("a");
        let id = task.id;
        let (mut board, api, _rx) = loaded_board(vec![task]).await;
        board.set_comment_draft(id, "hello");
        api.set_offline(true);

        assert!(board.submit_comment(id).await.is_err());
        assert_eq!(board.comment_draft(id), "hello");
        assert!(board.task(id).unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_filter_and_sort_visible_tasks() {
        let tasks = vec![
            Task::new("low").with_priority(TaskPriority::Low).with_category("home"),
            Task::new("urgent")
                .with_priority(TaskPriority::Urgent)
                .with_category("work"),
            Task::new("high").with_priority(TaskPriority::High).with_category("work"),
        ];
        let (mut board, _api, _rx) = loaded_board(tasks).await;

        board.set_sort(SortKey::Priority);
        let titles: Vec<&str> = board
            .visible_tasks()
            .into_iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["urgent", "high", "low"]);

        board.set_filter(FilterField::Category, "work").unwrap();
        let titles: Vec<&str> = board
            .visible_tasks()
            .into_iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["urgent", "high"]);
        assert_eq!(board.tasks().len(), 3);

        assert!(board.set_filter(FilterField::Status, "bogus").is_err());
        assert_eq!(
            board.filter_options(FilterField::Category),
            vec!["all", "home", "work"]
        );
    }
}
