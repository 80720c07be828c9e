use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use taskflow_core::task::{NewTask, Task, TaskPatch};
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Operations the task board needs from the server
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>>;

    async fn create(&self, task: &NewTask) -> Result<Task>;

    /// Merge `patch` into the stored task and return the full result
    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub(crate) fn http_client() -> Client {
    Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send `request` and turn a non-success status into a `ClientError`
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ClientError::from_status(status, message))
}

pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let bytes = send(request).await?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// reqwest implementation of [`TaskApi`]
#[derive(Clone)]
pub struct HttpTaskApi {
    client: Client,
    config: ClientConfig,
    token: Option<String>,
}

impl HttpTaskApi {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: http_client(),
            config,
            token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = self.config.url(path);
        debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>> {
        send_json(self.request(reqwest::Method::GET, "/tasks")).await
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        send_json(self.request(reqwest::Method::POST, "/tasks").json(task)).await
    }

    async fn update(&self, id: Uuid, patch: &TaskPatch) -> Result<Task> {
        send_json(
            self.request(reqwest::Method::PATCH, &format!("/tasks/{}", id))
                .json(patch),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        send(self.request(reqwest::Method::DELETE, &format!("/tasks/{}", id))).await?;
        Ok(())
    }
}
