//! Error types for workflow protocol operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::task::TaskState;

/// Main error type for workflow engine operations
#[derive(Debug, Error)]
pub enum FlowError {
    /// Transport-level error (network, connection, etc.)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (invalid message format, unsupported operation, etc.)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error (invalid request or response)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Deadline elapsed before the remote task reached a terminal state
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// A node executor reported a failure
    #[error("Node '{node_id}' failed: {source}")]
    NodeExecution {
        node_id: String,
        #[source]
        source: TaskError,
    },

    /// Attempted transition out of a terminal task state
    #[error("Invalid task state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: TaskState, to: TaskState },

    /// Task not found error
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// Workflow definition is not a valid DAG
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Whether this error is a communication failure that a retry budget may cover.
    ///
    /// Distinct from a reported remote failure: a `Failed` task is data, not an
    /// error, and is never retried here.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FlowError::Transport(_) | FlowError::Protocol(_) | FlowError::Serialization(_)
        )
    }

    /// Convert a communication failure into the executing node's failure record.
    pub fn into_task_error(self) -> TaskError {
        match self {
            FlowError::DeadlineExceeded => {
                TaskError::new("DEADLINE_EXCEEDED", "deadline exceeded")
            }
            other => TaskError::new("PROTOCOL_ERROR", other.to_string()),
        }
    }
}

/// Failure reported by a node executor, carried inside a `Failed` task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct TaskError {
    /// Error code (e.g., "EXECUTION_FAILED", "DEADLINE_EXCEEDED")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error details as structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TaskError {
    /// Create a new task error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an executor failure with the default code
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    /// Add details to the task error
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Result type alias for workflow operations
pub type FlowResult<T> = Result<T, FlowError>;

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FlowError::DeadlineExceeded
        } else if err.is_connect() {
            FlowError::Transport(format!("Connection error: {}", err))
        } else {
            FlowError::Transport(err.to_string())
        }
    }
}

impl From<&str> for FlowError {
    fn from(s: &str) -> Self {
        FlowError::Other(s.to_string())
    }
}

impl From<String> for FlowError {
    fn from(s: String) -> Self {
        FlowError::Other(s)
    }
}
