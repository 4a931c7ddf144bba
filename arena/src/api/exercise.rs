//! Task lifecycle endpoints.
//!
//! All orchestration flows through ExerciseActor; these handlers only
//! translate between HTTP and actor messages.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::actors::exercise::ExerciseMsg;
use crate::api::ApiState;
use shared_types::{AdmitRequest, AdmitResponse, SubmitInputRequest, SubmitInputResponse};

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// `POST /task` - admit a new exercise task.
pub async fn admit_task(
    State(state): State<ApiState>,
    Json(req): Json<AdmitRequest>,
) -> Response {
    if req.problem.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No 'problem' was provided.");
    }

    let exercise = state.app_state.exercise();
    let problem = req.problem.clone();
    match ractor::call!(exercise, |reply| ExerciseMsg::Admit { problem, reply }) {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(AdmitResponse {
                status: "started".to_string(),
                problem: req.problem,
            }),
        )
            .into_response(),
        // AlreadyRunning is a client error: rejected, not queued.
        Ok(Err(e)) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Exercise actor RPC failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "supervisor unavailable")
        }
    }
}

/// `POST /task/input` - route one human reply to the pending input request.
pub async fn submit_input(
    State(state): State<ApiState>,
    Json(req): Json<SubmitInputRequest>,
) -> Response {
    let exercise = state.app_state.exercise();
    let content = req.content;
    match ractor::call!(exercise, |reply| ExerciseMsg::SubmitInput { content, reply }) {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(SubmitInputResponse {
                status: "received".to_string(),
            }),
        )
            .into_response(),
        Ok(Err(e)) => error_response(StatusCode::CONFLICT, e.to_string()),
        Err(e) => {
            tracing::error!(error = %e, "Exercise actor RPC failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "supervisor unavailable")
        }
    }
}

/// `GET /task` - current task status.
pub async fn get_task_status(State(state): State<ApiState>) -> Response {
    let exercise = state.app_state.exercise();
    match ractor::call!(exercise, |reply| ExerciseMsg::GetStatus { reply }) {
        Ok(status) => (StatusCode::OK, Json(json!({ "status": status }))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Exercise actor RPC failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "supervisor unavailable")
        }
    }
}
