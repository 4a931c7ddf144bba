//! ConversationDriver seam.
//!
//! The driver produces the ordered sequence of conversation events for one
//! problem and may pause to request human input. The reasoning behind the
//! messages lives outside this crate; the supervisor only drains the event
//! channel and routes input requests through the bridge.

pub mod scripted;

pub use scripted::{ScriptStep, ScriptedDriver, EXIT_PHRASE, TERMINATION_PHRASE};

use async_trait::async_trait;
use ractor::ActorRef;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::actors::event_bus::EventBusMsg;
use crate::input_bridge::{InputBridge, InputError};
use shared_types::TaskEvent;

/// One frame produced by a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// A conversation message intended for observers.
    Message { source: String, content: String },

    /// An internal tool-execution result. Consumed by the agents themselves,
    /// never forwarded to observers.
    ToolExecution { source: String, summary: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("human input request was cancelled")]
    InputCancelled,

    #[error("event channel closed before the conversation finished")]
    ChannelClosed,

    #[error("{0}")]
    Failed(String),
}

/// A conversation driver: given a problem statement, emit events through
/// `io` until the conversation reaches its termination condition. A driver
/// must terminate on its designated termination phrase or internal
/// completion; it never runs unbounded.
#[async_trait]
pub trait ConversationDriver: Send + Sync {
    async fn run(&self, problem: String, io: DriverIo) -> Result<(), DriverError>;
}

/// The driver's side of the exercise run: an event channel drained by the
/// supervisor, and the human-input callback.
pub struct DriverIo {
    pub events: mpsc::Sender<DriverEvent>,
    pub input: HumanInput,
}

impl DriverIo {
    pub async fn emit(&self, event: DriverEvent) -> Result<(), DriverError> {
        self.events
            .send(event)
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }

    pub async fn say(
        &self,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), DriverError> {
        self.emit(DriverEvent::Message {
            source: source.into(),
            content: content.into(),
        })
        .await
    }
}

/// Human-input callback handed to the driver: publishes a `prompt` event,
/// arms the bridge, suspends until the request is resolved, and returns the
/// fulfilled value. The bridge clears the request once resolved.
pub struct HumanInput {
    bridge: Arc<InputBridge>,
    event_bus: ActorRef<EventBusMsg>,
    timeout: Option<Duration>,
}

impl HumanInput {
    pub fn new(
        bridge: Arc<InputBridge>,
        event_bus: ActorRef<EventBusMsg>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            bridge,
            event_bus,
            timeout,
        }
    }

    pub async fn request(&self, prompt: &str) -> Result<String, DriverError> {
        // Tell observers the conversation is waiting before arming, so the
        // prompt always precedes its matching user event on the stream.
        let _ = self.event_bus.cast(EventBusMsg::Publish {
            event: TaskEvent::prompt(prompt),
        });

        let request_id = self
            .bridge
            .arm(prompt)
            .await
            .map_err(|e| DriverError::Failed(e.to_string()))?;

        let resolved = match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.bridge.await_resolution(request_id)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(request_id, "Input request timed out; cancelling");
                        self.bridge.cancel().await;
                        Err(InputError::Cancelled)
                    }
                }
            }
            None => self.bridge.await_resolution(request_id).await,
        };

        resolved.map_err(|e| match e {
            InputError::Cancelled => DriverError::InputCancelled,
            other => DriverError::Failed(other.to_string()),
        })
    }
}
