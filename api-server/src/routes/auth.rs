use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{bad_request, internal_error, json_rejection, route_error, RouteError};
use crate::{
    auth::{AuthError, AuthSession, UserSummary},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest {
    email: String,
    password: String,
}

fn unauthorized(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

fn auth_error(err: AuthError) -> RouteError {
    match err {
        AuthError::InvalidInput(message) => bad_request(message),
        AuthError::Unauthorized(message) => unauthorized(message),
        AuthError::Conflict(message) => route_error(StatusCode::CONFLICT, message),
        AuthError::Storage(message) => internal_error(message),
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, RouteError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| unauthorized("Missing bearer token"))
}

/// POST /auth/signup
async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthSession>), RouteError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let session = state
        .auth_store()
        .sign_up(&req.email, &req.password)
        .await
        .map_err(auth_error)?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthSession>, RouteError> {
    let Json(req) = payload.map_err(json_rejection)?;
    let session = state
        .auth_store()
        .sign_in(&req.email, &req.password)
        .await
        .map_err(|err| {
            tracing::warn!("Failed sign-in attempt: {}", err);
            auth_error(err)
        })?;
    Ok(Json(session))
}

/// GET /auth/session - Resolve the bearer token to its user
async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserSummary>, RouteError> {
    let token = bearer_token(&headers)?;
    let user = state
        .auth_store()
        .authorize_bearer(token)
        .await
        .map_err(auth_error)?;
    Ok(Json(user))
}

/// POST /auth/logout - Tokens are stateless, the client drops its copy
async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/session", get(session))
        .route("/auth/logout", post(logout))
}
