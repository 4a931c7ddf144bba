//! Shared application state: the spawned actor refs and configuration.

use ractor::{Actor, ActorRef};
use std::sync::Arc;

use crate::actors::{EventBusActor, EventBusMsg, ExerciseActor, ExerciseArguments, ExerciseMsg};
use crate::config::Config;
use crate::driver::ConversationDriver;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    event_bus: ActorRef<EventBusMsg>,
    exercise: ActorRef<ExerciseMsg>,
    config: Config,
}

impl AppState {
    /// Spawn the event bus and the exercise supervisor, in that order.
    pub async fn spawn(
        config: Config,
        driver: Arc<dyn ConversationDriver>,
    ) -> Result<Self, ractor::SpawnErr> {
        let (event_bus, _bus_handle) = Actor::spawn(
            Some(format!("event_bus:{}", ulid::Ulid::new())),
            EventBusActor,
            (),
        )
        .await?;

        let (exercise, _exercise_handle) = Actor::spawn(
            Some(format!("exercise:{}", ulid::Ulid::new())),
            ExerciseActor,
            ExerciseArguments {
                event_bus: event_bus.clone(),
                driver,
                input_timeout: config.input_timeout,
            },
        )
        .await?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                event_bus,
                exercise,
                config,
            }),
        })
    }

    pub fn event_bus(&self) -> ActorRef<EventBusMsg> {
        self.inner.event_bus.clone()
    }

    pub fn exercise(&self) -> ActorRef<ExerciseMsg> {
        self.inner.exercise.clone()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}
