//! Run-scoped lifecycle event bus
//!
//! The engine emits lifecycle notifications for observability and UI
//! collaborators. One bus is constructed per run and handed to the engine;
//! subscriptions are scoped to that run's lifetime, never global.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lifecycle notification emitted by the engine
///
/// `NodeStarted` for a node is emitted when the engine releases it (its
/// upstream wait has resolved) and strictly precedes that node's terminal
/// event. `NodeSkipped` marks a node whose task ended `Canceled` — either it
/// was never dispatched, or its in-flight result was discarded by the run's
/// cancellation. `WorkflowFailed` is emitted at most once per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum FlowEvent {
    /// The engine released a node for processing
    #[serde(rename = "node.started")]
    NodeStarted { node_id: String },

    /// The node's task completed and its artifacts are visible in the session
    #[serde(rename = "node.completed")]
    NodeCompleted { node_id: String },

    /// The node's task failed
    #[serde(rename = "node.error")]
    NodeError { node_id: String, error: String },

    /// The node was cancelled without a failure of its own
    #[serde(rename = "node.skipped")]
    NodeSkipped { node_id: String },

    /// First failure of the run; fires the cancellation signal
    #[serde(rename = "workflow.failed")]
    WorkflowFailed { node_id: String, error: String },
}

impl FlowEvent {
    /// The node this event concerns
    pub fn node_id(&self) -> &str {
        match self {
            FlowEvent::NodeStarted { node_id }
            | FlowEvent::NodeCompleted { node_id }
            | FlowEvent::NodeError { node_id, .. }
            | FlowEvent::NodeSkipped { node_id }
            | FlowEvent::WorkflowFailed { node_id, .. } => node_id,
        }
    }
}

/// In-process event bus based on tokio broadcast channels
///
/// Publishing with no live subscribers is not an error; the engine's task
/// records remain the source of truth, the bus is a live view.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FlowEvent>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to this run's events
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all active subscribers
    pub fn emit(&self, event: FlowEvent) {
        // A lagging or absent receiver never fails the run
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
