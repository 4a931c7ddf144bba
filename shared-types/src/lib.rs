//! Wire types shared between the arena server and its clients
//!
//! Everything here crosses a process boundary as JSON: events fanned out to
//! websocket observers, and the request/response bodies of the HTTP API.
//! Serializable with serde; never mutated after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Task lifecycle
// ============================================================================

/// Lifecycle of the single-flight exercise task.
///
/// `Completed` and `Failed` are ephemeral: the supervisor collapses them back
/// to `Idle` during cleanup so a new task can be admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

// ============================================================================
// Event stream
// ============================================================================

/// One event on the observer stream.
///
/// The payload is internally tagged with `type`, so observers pattern-match
/// on the tag instead of sniffing payload shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Unique event identifier (ULID)
    pub id: String,

    /// When the event was produced
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: TaskEventKind,
}

/// Tagged event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TaskEventKind {
    /// System-level announcement (admission, session close)
    Sys { msg: String },

    /// The conversation is waiting for human input
    Prompt { msg: String },

    /// Human input that was accepted and routed into the conversation
    User { msg: String },

    /// A message produced by one of the scripted participants
    AgentMessage { source: String, msg: String },

    /// Terminal event: the driver failed
    Error { msg: String },

    /// Terminal event: the conversation finished normally
    Done { msg: String },
}

impl TaskEvent {
    pub fn new(kind: TaskEventKind) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn sys(msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::Sys { msg: msg.into() })
    }

    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::Prompt { msg: msg.into() })
    }

    pub fn user(msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::User { msg: msg.into() })
    }

    pub fn agent_message(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::AgentMessage {
            source: source.into(),
            msg: msg.into(),
        })
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::Error { msg: msg.into() })
    }

    pub fn done(msg: impl Into<String>) -> Self {
        Self::new(TaskEventKind::Done { msg: msg.into() })
    }

    /// The wire value of the `type` tag.
    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            TaskEventKind::Sys { .. } => "sys",
            TaskEventKind::Prompt { .. } => "prompt",
            TaskEventKind::User { .. } => "user",
            TaskEventKind::AgentMessage { .. } => "agent-message",
            TaskEventKind::Error { .. } => "error",
            TaskEventKind::Done { .. } => "done",
        }
    }

    /// The `msg` field of any variant.
    pub fn msg(&self) -> &str {
        match &self.kind {
            TaskEventKind::Sys { msg }
            | TaskEventKind::Prompt { msg }
            | TaskEventKind::User { msg }
            | TaskEventKind::AgentMessage { msg, .. }
            | TaskEventKind::Error { msg }
            | TaskEventKind::Done { msg } => msg,
        }
    }
}

// ============================================================================
// HTTP API bodies
// ============================================================================

/// Body of `POST /task`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitRequest {
    pub problem: String,
}

/// Response of `POST /task`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmitResponse {
    /// Always "started" on success
    pub status: String,
    pub problem: String,
}

/// Body of `POST /task/input`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInputRequest {
    pub content: String,
}

/// Response of `POST /task/input`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitInputResponse {
    /// Always "received" on success
    pub status: String,
}

// ============================================================================
// Log query
// ============================================================================

/// One parsed server-log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    /// `YYYY-MM-DD HH:MM:SS`, empty when the line had no parseable timestamp
    pub timestamp: String,
    pub message: String,
}

/// Response of `GET /logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    /// Post-filter, pre-pagination entry count
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub logs: Vec<LogEntry>,
}
