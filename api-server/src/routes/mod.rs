//! Route handlers

pub mod auth;
pub mod health;
pub mod task;

#[cfg(test)]
mod test_support;

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

pub fn route_error(status: StatusCode, error: impl Into<String>) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

pub fn bad_request(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::BAD_REQUEST, error)
}

pub fn not_found(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::NOT_FOUND, error)
}

pub fn internal_error(error: impl std::fmt::Display) -> RouteError {
    tracing::error!("Request failed: {}", error);
    route_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

/// Body rejections (bad JSON, unknown enum values, unknown fields) are 400s
pub fn json_rejection(rejection: JsonRejection) -> RouteError {
    bad_request(rejection.body_text())
}

pub fn path_rejection(rejection: PathRejection) -> RouteError {
    bad_request(rejection.body_text())
}

/// Full REST application with tracing and optional permissive CORS
pub fn app(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .merge(health::router())
        .merge(task::router())
        .merge(auth::router())
        .with_state(state);

    let router = if cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}
