//! Session-gated application shell
//!
//! A `TaskBoard` exists only while a session is present. Board operations
//! borrow the app mutably, so signing out cannot overlap an in-flight board
//! request, and any response for a dropped board is never applied.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::api::TaskApi;
use crate::auth::{AuthApi, AuthSession, SessionStore, User};
use crate::board::{BoardEvent, TaskBoard};
use crate::error::{ClientError, Result};

pub struct TaskApp<S, F, A> {
    sessions: SessionStore<S>,
    make_api: F,
    board: Option<MountedBoard<A>>,
}

struct MountedBoard<A> {
    user_id: Uuid,
    board: TaskBoard<A>,
}

impl<S, F, A> TaskApp<S, F, A>
where
    S: AuthApi,
    F: Fn(&AuthSession) -> A,
    A: TaskApi,
{
    /// `make_api` builds the task client for a freshly signed-in session
    pub fn new(sessions: SessionStore<S>, make_api: F) -> Self {
        Self {
            sessions,
            make_api,
            board: None,
        }
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn user(&self) -> Option<User> {
        self.sessions.current_user()
    }

    pub fn is_mounted(&self) -> bool {
        self.board.is_some()
    }

    pub fn board(&self) -> Option<&TaskBoard<A>> {
        self.board.as_ref().map(|mounted| &mounted.board)
    }

    pub fn board_mut(&mut self) -> Option<&mut TaskBoard<A>> {
        self.board.as_mut().map(|mounted| &mut mounted.board)
    }

    /// The mounted board, or `SignedOut`
    pub fn require_board(&mut self) -> Result<&mut TaskBoard<A>> {
        self.board_mut().ok_or(ClientError::SignedOut)
    }

    /// Bring the mounted board in line with the session.
    ///
    /// Returns the event receiver when a new board is mounted. A board for a
    /// different user is dropped before the new one is built.
    pub fn sync(&mut self) -> Option<mpsc::UnboundedReceiver<BoardEvent>> {
        let Some(session) = self.sessions.current() else {
            if self.board.take().is_some() {
                info!("Session ended, task board unmounted");
            }
            return None;
        };

        if let Some(mounted) = &self.board {
            if mounted.user_id == session.user.id {
                return None;
            }
            self.board = None;
        }

        let api = (self.make_api)(&session);
        let (board, rx) = TaskBoard::new(api, session.user.email.clone());
        self.board = Some(MountedBoard {
            user_id: session.user.id,
            board,
        });
        info!("Task board mounted for {}", session.user.email);
        Some(rx)
    }

    /// Sign in, mount a board and load it
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<mpsc::UnboundedReceiver<BoardEvent>> {
        self.sessions.sign_in(email, password).await?;
        self.mount_and_load().await
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<mpsc::UnboundedReceiver<BoardEvent>> {
        self.sessions.sign_up(email, password).await?;
        self.mount_and_load().await
    }

    pub async fn sign_out(&mut self) {
        self.sessions.sign_out().await;
        self.sync();
    }

    /// A board whose first load fails is dropped again; `sync` mounts a
    /// fresh one while the session lasts.
    async fn mount_and_load(&mut self) -> Result<mpsc::UnboundedReceiver<BoardEvent>> {
        self.board = None;
        let rx = self.sync().ok_or(ClientError::SignedOut)?;
        let loaded = match self.board_mut() {
            Some(board) => board.load().await,
            None => Err(ClientError::SignedOut),
        };
        if let Err(err) = loaded {
            self.board = None;
            return Err(err);
        }
        Ok(rx)
    }
}
