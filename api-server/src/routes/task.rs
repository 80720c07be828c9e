//! Task API endpoints
//!
//! RESTful API for task CRUD operations and comment appends.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskflow_core::task::{Comment, NewTask, Task, TaskPatch, TaskRepository};
use taskflow_core::Error;

use super::{bad_request, internal_error, json_rejection, not_found, path_rejection, RouteError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn store_error(err: Error) -> RouteError {
    match err {
        Error::TaskNotFound(id) => not_found(format!("Task {} not found", id)),
        Error::InvalidInput(message) => bad_request(message),
        other => internal_error(other),
    }
}

fn task_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, RouteError> {
    path.map(|Path(id)| id).map_err(path_rejection)
}

async fn load_task(state: &AppState, id: Uuid) -> Result<Task, RouteError> {
    state
        .task_store()
        .get(id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| not_found(format!("Task {} not found", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - List all tasks
async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, RouteError> {
    let tasks = state.task_store().list().await.map_err(store_error)?;
    Ok(Json(tasks))
}

/// POST /tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), RouteError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let task = req.into_task().map_err(store_error)?;

    let created = state.task_store().create(task).await.map_err(store_error)?;
    tracing::info!("Created task {}", created.id);

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Task>, RouteError> {
    let id = task_id(path)?;
    Ok(Json(load_task(&state, id).await?))
}

/// PATCH /tasks/{id} - Merge allow-listed fields onto a task
async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, RouteError> {
    let id = task_id(path)?;
    let Json(patch) = payload.map_err(json_rejection)?;

    let mut task = load_task(&state, id).await?;
    patch.apply(&mut task).map_err(store_error)?;

    let updated = state.task_store().update(task).await.map_err(store_error)?;
    Ok(Json(updated))
}

/// DELETE /tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, RouteError> {
    let id = task_id(path)?;
    tracing::debug!("Delete request received for task {}", id);

    let deleted = state.task_store().delete(id).await.map_err(store_error)?;
    if !deleted {
        return Err(not_found(format!("Task {} not found", id)));
    }

    tracing::info!("Deleted task {}", id);
    Ok(Json(MessageResponse {
        message: "Deleted Task".to_string(),
    }))
}

/// POST /tasks/{id}/comments - Append a comment
async fn add_comment(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), RouteError> {
    let id = task_id(path)?;
    let Json(req) = payload.map_err(json_rejection)?;

    let mut comment = Comment::new(req.content, req.author.unwrap_or_default());
    if let Some(created_at) = req.created_at {
        comment.created_at = created_at;
    }
    comment.validate().map_err(store_error)?;

    let mut task = load_task(&state, id).await?;
    task.comments.push(comment);

    let updated = state.task_store().update(task).await.map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(updated)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/comments", post(add_comment))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::routes::test_support::TestApp;

    async fn create(app: &TestApp, body: Value) -> Value {
        let (status, task) = app.send(Method::POST, "/tasks", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", task);
        task
    }

    fn timestamp(value: &Value) -> chrono::DateTime<chrono::Utc> {
        value.as_str().unwrap().parse().unwrap()
    }

    fn task_uri(task: &Value) -> String {
        format!("/tasks/{}", task["id"].as_str().unwrap())
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_defaults() {
        let app = TestApp::new().await;
        let task = create(
            &app,
            json!({ "title": "Write report", "dueDate": "2025-05-01", "category": "" }),
        )
        .await;

        assert!(task["id"].is_string());
        assert_eq!(task["status"], "todo");
        assert_eq!(task["priority"], "medium");
        assert_eq!(task["category"], Value::Null);
        assert_eq!(task["dueDate"], "2025-05-01T00:00:00Z");
        assert_eq!(task["comments"], json!([]));
        assert_eq!(task["createdAt"], task["updatedAt"]);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let app = TestApp::new().await;
        for body in [
            json!({ "title": "   " }),
            json!({ "description": "no title" }),
            json!({ "title": "x", "status": "done" }),
            json!({ "title": "x", "priority": "critical" }),
            json!({ "title": "x", "estimatedTime": -2 }),
            json!({ "title": "x", "dueDate": "someday" }),
        ] {
            let (status, error) = app.send(Method::POST, "/tasks", Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
            assert!(error["error"].is_string());
        }

        let (_, tasks) = app.send(Method::GET, "/tasks", None).await;
        assert_eq!(tasks, json!([]));
    }

    #[tokio::test]
    async fn test_list_and_get() {
        let app = TestApp::new().await;
        let first = create(&app, json!({ "title": "First" })).await;
        create(&app, json!({ "title": "Second" })).await;

        let (status, tasks) = app.send(Method::GET, "/tasks", None).await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<&str> = tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["First", "Second"]);

        let (status, fetched) = app.send(Method::GET, &task_uri(&first), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, first);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let app = TestApp::new().await;
        let missing = format!("/tasks/{}", uuid::Uuid::new_v4());

        let (status, _) = app.send(Method::GET, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .send(Method::PATCH, &missing, Some(json!({ "title": "x" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.send(Method::DELETE, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::GET, "/tasks/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_merges_allow_listed_fields() {
        let app = TestApp::new().await;
        let task = create(
            &app,
            json!({ "title": "Draft", "description": "old", "category": "A" }),
        )
        .await;

        let (status, updated) = app
            .send(
                Method::PATCH,
                &task_uri(&task),
                Some(json!({ "status": "review", "category": null })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "review");
        assert_eq!(updated["category"], Value::Null);
        assert_eq!(updated["description"], "old");
        assert_eq!(updated["createdAt"], task["createdAt"]);
        assert!(timestamp(&updated["updatedAt"]) >= timestamp(&task["updatedAt"]));
    }

    #[tokio::test]
    async fn test_patch_rejects_injection_and_bad_values() {
        let app = TestApp::new().await;
        let task = create(&app, json!({ "title": "Guarded" })).await;
        let uri = task_uri(&task);

        for body in [
            json!({ "id": uuid::Uuid::new_v4() }),
            json!({ "createdAt": "2020-01-01T00:00:00Z" }),
            json!({ "owner": "mallory" }),
            json!({ "status": "archived" }),
            json!({ "title": "" }),
        ] {
            let (status, _) = app.send(Method::PATCH, &uri, Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        }

        let (_, unchanged) = app.send(Method::GET, &uri, None).await;
        assert_eq!(unchanged, task);
    }

    #[tokio::test]
    async fn test_delete_confirms_and_removes() {
        let app = TestApp::new().await;
        let task = create(&app, json!({ "title": "Disposable" })).await;

        let (status, body) = app.send(Method::DELETE, &task_uri(&task), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Deleted Task");

        let (status, _) = app.send(Method::GET, &task_uri(&task), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comments_append_in_order() {
        let app = TestApp::new().await;
        let task = create(&app, json!({ "title": "Discuss" })).await;
        let uri = format!("{}/comments", task_uri(&task));

        let (status, _) = app
            .send(Method::POST, &uri, Some(json!({ "content": "first", "author": "ana" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, updated) = app
            .send(Method::POST, &uri, Some(json!({ "content": "second" })))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let comments = updated["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0]["content"], "first");
        assert_eq!(comments[0]["author"], "ana");
        assert_eq!(comments[1]["content"], "second");
        assert_eq!(comments[1]["author"], "Anonymous");

        let (status, _) = app
            .send(Method::POST, &uri, Some(json!({ "content": "  " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_comments_through_patch_replace_sequence() {
        let app = TestApp::new().await;
        let task = create(&app, json!({ "title": "Via patch" })).await;

        let (status, updated) = app
            .send(
                Method::PATCH,
                &task_uri(&task),
                Some(json!({ "comments": [
                    { "content": "one", "author": "a", "createdAt": "2025-01-01T00:00:00Z" },
                    { "content": "two", "author": "b", "createdAt": "2025-01-02T00:00:00Z" }
                ] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["comments"][1]["content"], "two");
    }

    #[tokio::test]
    async fn test_patch_comment_with_blank_author_is_anonymous() {
        let app = TestApp::new().await;
        let task = create(&app, json!({ "title": "Blank author" })).await;

        let (status, updated) = app
            .send(
                Method::PATCH,
                &task_uri(&task),
                Some(json!({ "comments": [
                    { "content": "hi", "author": "" },
                    { "content": "there", "author": "   " }
                ] })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["comments"][0]["author"], "Anonymous");
        assert_eq!(updated["comments"][1]["author"], "Anonymous");

        let (_, stored) = app.send(Method::GET, &task_uri(&task), None).await;
        assert_eq!(stored["comments"][0]["author"], "Anonymous");
    }
}
