//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - task browsing and the attempt flow under `/api/v1/...`
/// - teacher analytics under `/api/v1/classes/:class_id/...`
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/topics", get(http::http_get_topics))
        .route("/api/v1/tasks/:task_id", get(http::http_get_task))
        .route("/api/v1/attempts", post(http::http_post_attempt))
        .route("/api/v1/attempts/:attempt_id", get(http::http_get_attempt))
        .route("/api/v1/attempts/:attempt_id/steps", post(http::http_post_step))
        .route("/api/v1/classes", post(http::http_post_class))
        .route("/api/v1/classes/join", post(http::http_post_join_class))
        .route("/api/v1/classes/:class_id", get(http::http_get_class))
        .route("/api/v1/classes/:class_id/mistakes/recent", get(http::http_get_recent_mistakes))
        .route("/api/v1/classes/:class_id/mistakes/frequency", get(http::http_get_mistake_frequency))
        .route("/api/v1/classes/:class_id/mistakes/by-topic", get(http::http_get_mistakes_by_topic))
        .route("/api/v1/classes/:class_id/students", get(http::http_get_student_breakdown))
        .route("/api/v1/classes/:class_id/assistant", post(http::http_post_assistant))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
