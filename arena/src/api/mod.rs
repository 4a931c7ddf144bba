//! HTTP API routes for the arena server.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

pub mod exercise;
pub mod logs;
pub mod websocket;

use crate::app_state::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: AppState,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::ws_handler))
        // Task lifecycle routes
        .route(
            "/task",
            post(exercise::admit_task).get(exercise::get_task_status),
        )
        .route("/task/input", post(exercise::submit_input))
        // Server log query
        .route("/logs", get(logs::get_logs))
}

/// Health check endpoint
pub async fn health_check(State(_state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "arena",
            "version": "0.1.0"
        })),
    )
}
