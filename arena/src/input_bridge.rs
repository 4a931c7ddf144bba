//! InputBridge - single-slot rendezvous for out-of-band human input.
//!
//! One conversation step arms a request and suspends; an external reply call
//! fulfills it; task teardown cancels it. At most one request may be armed
//! at a time, and a suspended step always observes either the fulfilled value
//! or an explicit cancellation, never an indefinite hang.

use tokio::sync::{oneshot, Mutex};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("an input request is already armed")]
    AlreadyArmed,

    #[error("no input request is armed")]
    NotArmed,

    #[error("input request was already resolved")]
    AlreadyResolved,

    #[error("input request was cancelled")]
    Cancelled,
}

#[derive(Debug)]
enum Resolution {
    Fulfilled(String),
    Cancelled,
}

#[derive(Debug)]
struct Slot {
    id: u64,
    prompt: String,
    /// Taken on fulfill/cancel; `None` means the slot is resolved.
    tx: Option<oneshot::Sender<Resolution>>,
    /// Taken by the single `await_resolution` call.
    rx: Option<oneshot::Receiver<Resolution>>,
}

#[derive(Debug, Default)]
struct BridgeState {
    slot: Option<Slot>,
    next_id: u64,
}

/// Single-slot rendezvous, re-armed per request.
#[derive(Debug, Default)]
pub struct InputBridge {
    state: Mutex<BridgeState>,
}

impl InputBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a fresh request. Fails while a prior request is still in flight.
    pub async fn arm(&self, prompt: &str) -> Result<u64, InputError> {
        let mut state = self.state.lock().await;
        if state.slot.is_some() {
            return Err(InputError::AlreadyArmed);
        }

        state.next_id += 1;
        let id = state.next_id;
        let (tx, rx) = oneshot::channel();
        state.slot = Some(Slot {
            id,
            prompt: prompt.to_string(),
            tx: Some(tx),
            rx: Some(rx),
        });

        tracing::debug!(request_id = id, prompt = %prompt, "Input request armed");
        Ok(id)
    }

    /// Resolve the armed request with `value`.
    pub async fn fulfill(&self, value: impl Into<String>) -> Result<(), InputError> {
        let mut state = self.state.lock().await;
        let slot = state.slot.as_mut().ok_or(InputError::NotArmed)?;
        let tx = slot.tx.take().ok_or(InputError::AlreadyResolved)?;

        tracing::debug!(request_id = slot.id, "Input request fulfilled");
        // A dropped receiver means the waiting step is already gone; the
        // request still counts as resolved.
        let _ = tx.send(Resolution::Fulfilled(value.into()));
        Ok(())
    }

    /// Resolve any armed, unresolved request as cancelled. Idempotent.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut slot) = state.slot.take() {
            if let Some(tx) = slot.tx.take() {
                tracing::debug!(request_id = slot.id, "Cancelling pending input request");
                let _ = tx.send(Resolution::Cancelled);
            }
        }
    }

    /// Suspend until the identified request is resolved, then return the
    /// fulfilled value or signal cancellation. Clears the slot afterwards so
    /// a new request can be armed. Safe to call exactly once per armed slot.
    pub async fn await_resolution(&self, request_id: u64) -> Result<String, InputError> {
        let rx = {
            let mut state = self.state.lock().await;
            match state.slot.as_mut() {
                Some(slot) if slot.id == request_id => {
                    slot.rx.take().ok_or(InputError::NotArmed)?
                }
                _ => return Err(InputError::NotArmed),
            }
        };

        let outcome = rx.await;

        let mut state = self.state.lock().await;
        if state.slot.as_ref().is_some_and(|slot| slot.id == request_id) {
            state.slot = None;
        }

        match outcome {
            Ok(Resolution::Fulfilled(value)) => Ok(value),
            Ok(Resolution::Cancelled) | Err(_) => Err(InputError::Cancelled),
        }
    }

    /// Prompt of the currently armed request, if any.
    pub async fn pending_prompt(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.slot.as_ref().map(|slot| slot.prompt.clone())
    }
}
