//! Actor system for the arena server.

pub mod event_bus;
pub mod exercise;

pub use event_bus::{EventBusActor, EventBusMsg, ObserverSender};
pub use exercise::{ExerciseActor, ExerciseArguments, ExerciseError, ExerciseMsg, RunOutcome};
