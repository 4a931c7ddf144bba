//! EventBusActor - best-effort fanout of task events to live observers.
//!
//! The actor owns the observer set; nobody else mutates it. Observers are
//! registered as channel senders (one per websocket writer task), receive
//! only events published after attachment, and are silently pruned when a
//! send fails. A failed send never aborts delivery to the remaining
//! observers and never surfaces to the publisher.

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::collections::HashMap;
use tokio::sync::mpsc;

use shared_types::TaskEvent;

/// Delivery handle for one observer.
pub type ObserverSender = mpsc::UnboundedSender<TaskEvent>;

/// Messages handled by EventBusActor
#[derive(Debug)]
pub enum EventBusMsg {
    /// Register a new observer; replies with its subscription id.
    Attach {
        sender: ObserverSender,
        reply: RpcReplyPort<String>,
    },

    /// Idempotent removal of an observer.
    Detach { subscription: String },

    /// Deliver `event` to every currently attached observer, best-effort.
    Publish { event: TaskEvent },

    /// Current live observer count (for tests/diagnostics).
    ObserverCount { reply: RpcReplyPort<usize> },
}

/// State for EventBusActor
pub struct EventBusState {
    observers: HashMap<String, ObserverSender>,
}

/// Actor that fans task events out to all attached observers
#[derive(Debug, Default)]
pub struct EventBusActor;

#[async_trait]
impl Actor for EventBusActor {
    type Msg = EventBusMsg;
    type State = EventBusState;
    type Arguments = ();

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(actor_id = %myself.get_id(), "EventBusActor starting");
        Ok(EventBusState {
            observers: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            EventBusMsg::Attach { sender, reply } => {
                let subscription = ulid::Ulid::new().to_string();
                state.observers.insert(subscription.clone(), sender);
                tracing::info!(
                    subscription = %subscription,
                    observers = state.observers.len(),
                    "Observer attached"
                );
                let _ = reply.send(subscription);
            }
            EventBusMsg::Detach { subscription } => {
                if state.observers.remove(&subscription).is_some() {
                    tracing::info!(
                        subscription = %subscription,
                        observers = state.observers.len(),
                        "Observer detached"
                    );
                }
            }
            EventBusMsg::Publish { event } => {
                tracing::debug!(
                    event_id = %event.id,
                    event_type = event.type_tag(),
                    observers = state.observers.len(),
                    "Publishing event"
                );
                // A send failure means the observer's writer task is gone;
                // drop it from the live set and keep delivering to the rest.
                state.observers.retain(|subscription, sender| {
                    if sender.send(event.clone()).is_err() {
                        tracing::warn!(
                            subscription = %subscription,
                            "Observer send failed; removing from live set"
                        );
                        false
                    } else {
                        true
                    }
                });
            }
            EventBusMsg::ObserverCount { reply } => {
                let _ = reply.send(state.observers.len());
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        _state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        tracing::info!(actor_id = %myself.get_id(), "EventBusActor stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn spawn_bus() -> ActorRef<EventBusMsg> {
        let (bus, _handle) = Actor::spawn(None, EventBusActor, ()).await.unwrap();
        bus
    }

    async fn attach(
        bus: &ActorRef<EventBusMsg>,
    ) -> (String, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = ractor::call!(bus, |reply| EventBusMsg::Attach { sender: tx, reply })
            .expect("attach RPC failed");
        (subscription, rx)
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<TaskEvent>) -> TaskEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("observer channel closed")
    }

    #[tokio::test]
    async fn test_publish_reaches_all_observers() {
        let bus = spawn_bus().await;
        let (_s1, mut rx1) = attach(&bus).await;
        let (_s2, mut rx2) = attach(&bus).await;

        let event = TaskEvent::sys("hello");
        bus.cast(EventBusMsg::Publish {
            event: event.clone(),
        })
        .unwrap();

        assert_eq!(recv(&mut rx1).await, event);
        assert_eq!(recv(&mut rx2).await, event);
    }

    #[tokio::test]
    async fn test_dead_observer_is_pruned_without_blocking_others() {
        let bus = spawn_bus().await;
        let (_live, mut rx_live) = attach(&bus).await;
        let (_dead, rx_dead) = attach(&bus).await;
        drop(rx_dead);

        bus.cast(EventBusMsg::Publish {
            event: TaskEvent::sys("first"),
        })
        .unwrap();
        assert_eq!(recv(&mut rx_live).await.msg(), "first");

        let count = ractor::call!(bus, |reply| EventBusMsg::ObserverCount { reply }).unwrap();
        assert_eq!(count, 1, "dead observer must be removed after failed send");

        // Subsequent publishes no longer attempt delivery to the dead one.
        bus.cast(EventBusMsg::Publish {
            event: TaskEvent::sys("second"),
        })
        .unwrap();
        assert_eq!(recv(&mut rx_live).await.msg(), "second");
    }

    #[tokio::test]
    async fn test_no_backlog_replay_on_attach() {
        let bus = spawn_bus().await;
        bus.cast(EventBusMsg::Publish {
            event: TaskEvent::sys("before attach"),
        })
        .unwrap();

        // Synchronize on the mailbox so the publish is fully processed.
        let _ = ractor::call!(bus, |reply| EventBusMsg::ObserverCount { reply }).unwrap();

        let (_s, mut rx) = attach(&bus).await;
        bus.cast(EventBusMsg::Publish {
            event: TaskEvent::sys("after attach"),
        })
        .unwrap();

        assert_eq!(recv(&mut rx).await.msg(), "after attach");
        assert!(rx.try_recv().is_err(), "no replay of earlier events");
    }

    #[tokio::test]
    async fn test_detach_is_idempotent() {
        let bus = spawn_bus().await;
        let (subscription, mut rx) = attach(&bus).await;

        bus.cast(EventBusMsg::Detach {
            subscription: subscription.clone(),
        })
        .unwrap();
        bus.cast(EventBusMsg::Detach { subscription }).unwrap();

        bus.cast(EventBusMsg::Publish {
            event: TaskEvent::sys("gone"),
        })
        .unwrap();
        let count = ractor::call!(bus, |reply| EventBusMsg::ObserverCount { reply }).unwrap();
        assert_eq!(count, 0);
        // The bus dropped our sender, so the channel terminates.
        let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_events_arrive_in_publication_order() {
        let bus = spawn_bus().await;
        let (_s, mut rx) = attach(&bus).await;

        for i in 0..10 {
            bus.cast(EventBusMsg::Publish {
                event: TaskEvent::sys(format!("event-{i}")),
            })
            .unwrap();
        }
        for i in 0..10 {
            assert_eq!(recv(&mut rx).await.msg(), format!("event-{i}"));
        }
    }
}
