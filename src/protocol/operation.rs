//! Protocol operations

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Abstract protocol operations
///
/// Each operation is binding-independent; `endpoint()` and `method()` give
/// the HTTP+JSON mapping used by the bundled transports.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Send a message to a node, creating one task
    SendMessage {
        /// The message to send
        message: Message,

        /// Optional per-call preferences
        configuration: Option<SendConfiguration>,
    },

    /// Get a task by ID
    GetTask {
        /// The task ID to retrieve
        task_id: String,
    },

    /// Cancel a task
    CancelTask {
        /// The task ID to cancel
        task_id: String,
    },

    /// Discover node capabilities (fetch the agent card)
    DiscoverAgent,
}

/// Per-call preferences for `SendMessage`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendConfiguration {
    /// MIME types the caller accepts in produced artifacts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accepted_output_modes: Vec<String>,
}

impl SendConfiguration {
    /// Accept only the given output modes
    pub fn accepting(modes: Vec<String>) -> Self {
        Self {
            accepted_output_modes: modes,
        }
    }
}

impl Operation {
    /// Get the HTTP endpoint path for this operation
    pub fn endpoint(&self) -> String {
        match self {
            Operation::SendMessage { .. } => "/messages".to_string(),
            Operation::GetTask { task_id } => format!("/tasks/{}", task_id),
            Operation::CancelTask { task_id } => format!("/tasks/{}/cancel", task_id),
            Operation::DiscoverAgent => "/.well-known/agent-card.json".to_string(),
        }
    }

    /// Get the HTTP method for this operation
    pub fn method(&self) -> &'static str {
        match self {
            Operation::SendMessage { .. } => "POST",
            Operation::GetTask { .. } => "GET",
            Operation::CancelTask { .. } => "POST",
            Operation::DiscoverAgent => "GET",
        }
    }
}
