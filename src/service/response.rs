//! Service response types

use crate::protocol::{agent::AgentCard, task::Task};

/// Response from a protocol service operation
#[derive(Debug, Clone)]
pub enum FlowResponse {
    /// Task response (from SendMessage, GetTask, CancelTask)
    Task(Box<Task>),

    /// Agent card response (from DiscoverAgent)
    AgentCard(Box<AgentCard>),

    /// Empty response (for operations with no return value)
    Empty,
}

impl FlowResponse {
    /// Extract a task from the response, if present
    pub fn into_task(self) -> Option<Task> {
        match self {
            FlowResponse::Task(task) => Some(*task),
            _ => None,
        }
    }

    /// Extract an agent card from the response, if present
    pub fn into_agent_card(self) -> Option<AgentCard> {
        match self {
            FlowResponse::AgentCard(card) => Some(*card),
            _ => None,
        }
    }

    /// Check if the response is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, FlowResponse::Empty)
    }
}
