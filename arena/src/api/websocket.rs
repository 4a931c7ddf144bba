//! Observer websocket - live event stream fanout.
//!
//! Each connection attaches one channel to the event bus and forwards every
//! received event as a JSON text frame. Inbound data from the observer side
//! is read and discarded; only pings and close frames matter.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use ractor::ActorRef;
use tokio::sync::mpsc;

use crate::actors::event_bus::EventBusMsg;
use crate::api::ApiState;
use shared_types::TaskEvent;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    let event_bus = state.app_state.event_bus();
    ws.on_upgrade(move |socket| handle_observer_socket(socket, event_bus))
}

async fn handle_observer_socket(socket: WebSocket, event_bus: ActorRef<EventBusMsg>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<TaskEvent>();

    let subscription = match ractor::call!(event_bus, |reply| EventBusMsg::Attach {
        sender: tx,
        reply
    }) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Observer attach failed");
            return;
        }
    };
    tracing::info!(subscription = %subscription, "Observer connection established");

    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event) => {
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to serialize event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // The bus pruned us after a failed send, or shut down.
                    None => break,
                }
            }
            maybe_msg = receiver.next() => {
                match maybe_msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Inbound observer data is read and discarded.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(subscription = %subscription, error = %e, "Observer receive error");
                        break;
                    }
                }
            }
        }
    }

    let _ = event_bus.cast(EventBusMsg::Detach {
        subscription: subscription.clone(),
    });
    tracing::info!(subscription = %subscription, "Observer connection closed");
}
