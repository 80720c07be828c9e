//! Email/password session handling
//!
//! `SessionStore` owns the current session and broadcasts every change over
//! a `watch` channel, so views can gate themselves on "signed in or not"
//! without polling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{http_client, send, send_json};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// The identity capability behind a [`SessionStore`]
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Resolve a token back to its user; rejected tokens are `Unauthorized`
    async fn current_user(&self, token: &str) -> Result<User>;

    async fn sign_out(&self, token: &str) -> Result<()>;
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// HTTP client for the server's `/auth` endpoints
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    config: ClientConfig,
}

impl AuthClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession> {
        send_json(
            self.client
                .post(self.config.url("/auth/signup"))
                .json(&Credentials { email, password }),
        )
        .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        send_json(
            self.client
                .post(self.config.url("/auth/login"))
                .json(&Credentials { email, password }),
        )
        .await
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        send_json(
            self.client
                .get(self.config.url("/auth/session"))
                .bearer_auth(token),
        )
        .await
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        send(
            self.client
                .post(self.config.url("/auth/logout"))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }
}

/// Holder of the current session
pub struct SessionStore<A> {
    api: A,
    tx: watch::Sender<Option<AuthSession>>,
}

impl<A: AuthApi> SessionStore<A> {
    pub fn new(api: A) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { api, tx }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.tx.borrow().as_ref().map(|session| session.user.clone())
    }

    /// Receiver that observes every session change
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.tx.subscribe()
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User> {
        let session = self.api.sign_up(email, password).await?;
        info!("Signed up as {}", session.user.email);
        Ok(self.replace(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let session = self.api.sign_in(email, password).await?;
        info!("Signed in as {}", session.user.email);
        Ok(self.replace(session))
    }

    /// Clear the session. The local session is dropped even when the server
    /// call fails.
    pub async fn sign_out(&self) {
        let Some(session) = self.tx.send_replace(None) else {
            return;
        };
        if let Err(err) = self.api.sign_out(&session.token).await {
            warn!("Sign-out request failed: {}", err);
        }
        info!("Signed out {}", session.user.email);
    }

    /// Check the held session against the server, clearing it when the
    /// token has expired or been rejected.
    pub async fn refresh(&self) -> Result<Option<User>> {
        let Some(session) = self.current() else {
            return Ok(None);
        };
        if session.is_expired() {
            self.clear_if_current(&session.token);
            return Ok(None);
        }

        match self.api.current_user(&session.token).await {
            Ok(user) => Ok(Some(user)),
            Err(ClientError::Unauthorized { message }) => {
                warn!("Session rejected: {}", message);
                self.clear_if_current(&session.token);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn replace(&self, session: AuthSession) -> User {
        let user = session.user.clone();
        self.tx.send_replace(Some(session));
        user
    }

    fn clear_if_current(&self, token: &str) {
        self.tx.send_if_modified(|current| {
            if current.as_ref().is_some_and(|session| session.token == token) {
                *current = None;
                true
            } else {
                false
            }
        });
    }
}
