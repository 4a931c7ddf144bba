//! ExerciseActor - single-flight lifecycle supervisor for the agent exercise.
//!
//! Owns the task state machine, the input bridge, and the conversation run.
//! At most one task runs process-wide: admission while a task is running is
//! rejected, never queued. Every run path (success, driver failure, panic)
//! reaches the same cleanup: pending input is cancelled, status returns to
//! Idle, and observers get a terminal event plus a closing `sys` event.

use async_trait::async_trait;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::actors::event_bus::EventBusMsg;
use crate::driver::{ConversationDriver, DriverEvent, DriverIo, HumanInput};
use crate::input_bridge::{InputBridge, InputError};
use shared_types::{TaskEvent, TaskStatus};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ExerciseError {
    #[error("a task is already running")]
    AlreadyRunning,

    #[error("no pending input request")]
    NoPendingInput,
}

/// Terminal outcome of one conversation run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed,
    Failed { reason: String },
}

/// Messages handled by ExerciseActor
#[derive(Debug)]
pub enum ExerciseMsg {
    /// Admit a new task. Non-blocking: the caller gets an answer as soon as
    /// the run is spawned, not when it finishes.
    Admit {
        problem: String,
        reply: RpcReplyPort<Result<(), ExerciseError>>,
    },

    /// Route one human reply to the armed input request.
    SubmitInput {
        content: String,
        reply: RpcReplyPort<Result<(), ExerciseError>>,
    },

    /// Current task status.
    GetStatus { reply: RpcReplyPort<TaskStatus> },

    /// Internal: the conversation run reached its end.
    RunFinished { outcome: RunOutcome },
}

/// Arguments for spawning ExerciseActor
pub struct ExerciseArguments {
    pub event_bus: ActorRef<EventBusMsg>,
    pub driver: Arc<dyn ConversationDriver>,
    /// Optional deadline for a pending human-input request; off by default.
    pub input_timeout: Option<Duration>,
}

/// State for ExerciseActor
pub struct ExerciseState {
    event_bus: ActorRef<EventBusMsg>,
    driver: Arc<dyn ConversationDriver>,
    input_timeout: Option<Duration>,
    status: TaskStatus,
    bridge: Arc<InputBridge>,
    /// Opaque handle to the in-flight conversation run.
    run: Option<JoinHandle<()>>,
}

impl ExerciseState {
    fn publish(&self, event: TaskEvent) {
        let _ = self.event_bus.cast(EventBusMsg::Publish { event });
    }
}

#[derive(Debug, Default)]
pub struct ExerciseActor;

#[async_trait]
impl Actor for ExerciseActor {
    type Msg = ExerciseMsg;
    type State = ExerciseState;
    type Arguments = ExerciseArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(actor_id = %myself.get_id(), "ExerciseActor starting");
        Ok(ExerciseState {
            event_bus: args.event_bus,
            driver: args.driver,
            input_timeout: args.input_timeout,
            status: TaskStatus::Idle,
            bridge: Arc::new(InputBridge::new()),
            run: None,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ExerciseMsg::Admit { problem, reply } => {
                if state.status == TaskStatus::Running {
                    tracing::info!(problem = %problem, "Admission rejected: task already running");
                    let _ = reply.send(Err(ExerciseError::AlreadyRunning));
                    return Ok(());
                }

                state.status = TaskStatus::Running;
                state.publish(TaskEvent::sys(format!(
                    "Received problem '{problem}'. Assembling agent team for this session..."
                )));

                let handle = tokio::spawn(run_exercise(
                    problem.clone(),
                    state.driver.clone(),
                    state.bridge.clone(),
                    state.event_bus.clone(),
                    state.input_timeout,
                    myself.clone(),
                ));
                state.run = Some(handle);

                tracing::info!(problem = %problem, "Task admitted");
                let _ = reply.send(Ok(()));
            }

            ExerciseMsg::SubmitInput { content, reply } => {
                match state.bridge.fulfill(content.clone()).await {
                    Ok(()) => {
                        // Published only after the fulfillment is accepted,
                        // so `user` follows its `prompt` on the stream.
                        state.publish(TaskEvent::user(content));
                        let _ = reply.send(Ok(()));
                    }
                    Err(InputError::NotArmed) | Err(InputError::AlreadyResolved) => {
                        let _ = reply.send(Err(ExerciseError::NoPendingInput));
                    }
                    Err(other) => {
                        tracing::warn!(error = %other, "Unexpected input bridge state");
                        let _ = reply.send(Err(ExerciseError::NoPendingInput));
                    }
                }
            }

            ExerciseMsg::GetStatus { reply } => {
                let _ = reply.send(state.status);
            }

            ExerciseMsg::RunFinished { outcome } => {
                match &outcome {
                    RunOutcome::Completed => {
                        tracing::info!("Conversation run completed");
                        state.publish(TaskEvent::done("Team has finished the task."));
                    }
                    RunOutcome::Failed { reason } => {
                        tracing::error!(error = %reason, "Conversation run failed");
                        state.publish(TaskEvent::error(reason.clone()));
                    }
                }

                // Release any step still suspended on human input so it
                // observes a cancellation instead of hanging; later
                // SubmitInput calls find nothing armed.
                state.bridge.cancel().await;
                state.run = None;
                // Completed/Failed collapse straight back to Idle so the
                // next admission succeeds.
                state.status = TaskStatus::Idle;
                state.publish(TaskEvent::sys(
                    "Session closed. Ready for a new problem.",
                ));
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.bridge.cancel().await;
        if let Some(run) = state.run.take() {
            run.abort();
        }
        tracing::info!(actor_id = %myself.get_id(), "ExerciseActor stopped");
        Ok(())
    }
}

/// One conversation run: drain the driver's event sequence, publishing each
/// observer-facing frame in order, then report the terminal outcome back to
/// the supervisor. All failure modes funnel into `RunFinished`.
async fn run_exercise(
    problem: String,
    driver: Arc<dyn ConversationDriver>,
    bridge: Arc<InputBridge>,
    event_bus: ActorRef<EventBusMsg>,
    input_timeout: Option<Duration>,
    supervisor: ActorRef<ExerciseMsg>,
) {
    let (tx, mut rx) = mpsc::channel::<DriverEvent>(32);
    let io = DriverIo {
        events: tx,
        input: HumanInput::new(bridge, event_bus.clone(), input_timeout),
    };

    let run = tokio::spawn(async move { driver.run(problem, io).await });

    while let Some(event) = rx.recv().await {
        match event {
            DriverEvent::Message { source, content } => {
                let _ = event_bus.cast(EventBusMsg::Publish {
                    event: TaskEvent::agent_message(source, content),
                });
            }
            DriverEvent::ToolExecution { source, summary } => {
                // Tool output is for the agents, not the observer stream.
                tracing::debug!(source = %source, summary = %summary, "Skipping tool execution result");
            }
        }
    }

    let outcome = match run.await {
        Ok(Ok(())) => RunOutcome::Completed,
        Ok(Err(e)) => RunOutcome::Failed {
            reason: e.to_string(),
        },
        Err(e) => RunOutcome::Failed {
            reason: format!("conversation task panicked: {e}"),
        },
    };

    let _ = supervisor.cast(ExerciseMsg::RunFinished { outcome });
}
