//! Deterministic scripted driver.
//!
//! Round-robin between a coding agent and a critic agent working a problem,
//! with optional human-input steps. Stands in where a model-backed driver
//! would plug into the `ConversationDriver` seam, and doubles as the test
//! vehicle for the supervisor's lifecycle handling.

use async_trait::async_trait;

use super::{ConversationDriver, DriverError, DriverEvent, DriverIo};

/// An agent message containing this phrase ends the conversation.
pub const TERMINATION_PHRASE: &str = "Approved";

/// A human reply equal to this phrase ends the conversation immediately.
pub const EXIT_PHRASE: &str = "exit";

/// Hard cap on conversation turns, so a mis-scripted driver can never run
/// unbounded.
const MAX_TURNS: usize = 64;

pub const CODING_AGENT: &str = "Coding_Agent";
pub const CRITIC_AGENT: &str = "Critic_Agent";

#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a conversation message.
    Say { source: String, content: String },

    /// Emit an internal tool-execution result (skipped by the supervisor).
    ToolCall { source: String, summary: String },

    /// Pause and request human input.
    AskHuman { prompt: String },

    /// Abort the conversation with an error.
    Fail { message: String },
}

impl ScriptStep {
    pub fn say(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Say {
            source: source.into(),
            content: content.into(),
        }
    }

    pub fn tool_call(source: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::ToolCall {
            source: source.into(),
            summary: summary.into(),
        }
    }

    pub fn ask_human(prompt: impl Into<String>) -> Self {
        Self::AskHuman {
            prompt: prompt.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    steps: Vec<ScriptStep>,
}

impl ScriptedDriver {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self { steps }
    }

    /// The default two-agent exchange: propose, check, approve.
    pub fn demo() -> Self {
        Self::new(vec![
            ScriptStep::say(
                CODING_AGENT,
                "Here is a candidate solution with unit tests.",
            ),
            ScriptStep::tool_call(CODING_AGENT, "compile_and_run: exit status 0"),
            ScriptStep::say(
                CRITIC_AGENT,
                format!("Tests pass and the edge cases are covered. {TERMINATION_PHRASE}"),
            ),
        ])
    }
}

#[async_trait]
impl ConversationDriver for ScriptedDriver {
    async fn run(&self, problem: String, io: DriverIo) -> Result<(), DriverError> {
        io.say(
            CODING_AGENT,
            format!("You are tasked to solve the problem: '{problem}'."),
        )
        .await?;

        for (turn, step) in self.steps.iter().enumerate() {
            if turn >= MAX_TURNS {
                tracing::warn!(turns = turn, "Turn cap reached; ending conversation");
                break;
            }

            match step {
                ScriptStep::Say { source, content } => {
                    io.say(source.clone(), content.clone()).await?;
                    if content.contains(TERMINATION_PHRASE) {
                        tracing::debug!(source = %source, "Termination phrase seen");
                        return Ok(());
                    }
                }
                ScriptStep::ToolCall { source, summary } => {
                    io.emit(DriverEvent::ToolExecution {
                        source: source.clone(),
                        summary: summary.clone(),
                    })
                    .await?;
                }
                ScriptStep::AskHuman { prompt } => {
                    let answer = io.input.request(prompt).await?;
                    if answer.trim().eq_ignore_ascii_case(EXIT_PHRASE) {
                        tracing::debug!("Exit phrase received from human");
                        return Ok(());
                    }
                    io.say(
                        CRITIC_AGENT,
                        format!("Incorporating human guidance: {answer}"),
                    )
                    .await?;
                }
                ScriptStep::Fail { message } => {
                    return Err(DriverError::Failed(message.clone()));
                }
            }
        }

        Ok(())
    }
}
