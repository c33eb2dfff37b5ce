//! Task types and lifecycle management
//!
//! A task is the execution record of one RPC invocation against a node. Its
//! state only ever moves forward: `Created → Working → {Completed | Failed |
//! InputRequired}`, with any non-terminal state free to move to `Canceled`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    error::{FlowError, FlowResult, TaskError},
    message::Message,
    Artifact,
};

/// The execution record of one node invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier for the task (one per invocation attempt)
    pub id: String,

    /// Current lifecycle state
    pub state: TaskState,

    /// Messages exchanged for this invocation, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,

    /// Artifacts produced by the invocation (present only when completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,

    /// Error information (present only when failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,

    /// When the task was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Optional context ID grouping the tasks of one run
    #[serde(rename = "contextId", skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

impl Task {
    /// Create a new task in the `Created` state
    pub fn new(id: impl Into<String>, input: Message) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Created,
            history: vec![input],
            artifacts: None,
            error: None,
            created_at: Utc::now(),
            updated_at: None,
            context_id: None,
        }
    }

    /// Create a task record with no input message
    ///
    /// Used by the engine for nodes that are resolved without ever being
    /// dispatched (skipped or cancelled before a message existed).
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Created,
            history: Vec::new(),
            artifacts: None,
            error: None,
            created_at: Utc::now(),
            updated_at: None,
            context_id: None,
        }
    }

    /// Set the context ID
    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Transition to a new state, enforcing the lifecycle rules
    ///
    /// Returns `FlowError::InvalidStateTransition` when the transition is not
    /// allowed. Cancelling an already-cancelled task is an idempotent no-op.
    pub fn transition(&mut self, to: TaskState) -> FlowResult<()> {
        if self.state == TaskState::Canceled && to == TaskState::Canceled {
            return Ok(());
        }
        if !self.state.can_transition_to(to) {
            return Err(FlowError::InvalidStateTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Move the task from `Created` to `Working`
    pub fn start(&mut self) -> FlowResult<()> {
        self.transition(TaskState::Working)
    }

    /// Complete the task with its produced artifacts
    ///
    /// This is the only way artifacts attach to a task.
    pub fn complete(&mut self, artifacts: Vec<Artifact>) -> FlowResult<()> {
        self.transition(TaskState::Completed)?;
        self.artifacts = Some(artifacts);
        Ok(())
    }

    /// Fail the task with an error description
    pub fn fail(&mut self, error: TaskError) -> FlowResult<()> {
        self.transition(TaskState::Failed)?;
        self.error = Some(error);
        Ok(())
    }

    /// Park the task awaiting further input
    pub fn require_input(&mut self) -> FlowResult<()> {
        self.transition(TaskState::InputRequired)
    }

    /// Cancel the task
    ///
    /// Carries neither artifacts nor an error; idempotent on an
    /// already-cancelled task.
    pub fn cancel(&mut self) -> FlowResult<()> {
        self.transition(TaskState::Canceled)
    }

    /// Append a message to the task history
    pub fn push_history(&mut self, message: Message) {
        self.history.push(message);
    }
}

/// Task lifecycle state
///
/// `Completed`, `Failed` and `Canceled` are terminal; `InputRequired` is a
/// resting state that may resume to `Working`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Task has been accepted and recorded, no work started yet
    Created,

    /// Task is currently being processed
    Working,

    /// Task requires additional input before it can continue
    InputRequired,

    /// Task completed successfully
    Completed,

    /// Task failed with an error
    Failed,

    /// Task was cancelled before reaching another terminal state
    Canceled,
}

impl TaskState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }

    /// Whether the lifecycle permits moving from `self` to `to`
    pub fn can_transition_to(&self, to: TaskState) -> bool {
        match (self, to) {
            // Any non-terminal state may be cancelled
            (from, TaskState::Canceled) => !from.is_terminal(),
            (TaskState::Created, TaskState::Working) => true,
            (TaskState::Working, TaskState::Completed)
            | (TaskState::Working, TaskState::Failed)
            | (TaskState::Working, TaskState::InputRequired) => true,
            (TaskState::InputRequired, TaskState::Working) => true,
            _ => false,
        }
    }
}
