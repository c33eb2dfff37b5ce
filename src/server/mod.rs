//! Per-node protocol responder

pub mod executor;

pub use executor::{executor_fn, ExecutionInput, ExecutorRegistry, NodeExecutor};

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    protocol::{
        agent::AgentCard,
        error::{FlowError, FlowResult},
        message::Message,
        operation::SendConfiguration,
        task::Task,
    },
    session::Session,
    workflow::NodeDefinition,
};

/// A node acting as a protocol responder
///
/// Accepts `sendMessage`, `getTask` and `cancelTask` for one node of the
/// workflow, and exposes the node's agent card. Each accepted message creates
/// exactly one task and invokes the node's executor exactly once; the task is
/// recorded in the table before any side-effecting work begins, so a
/// concurrent status read immediately after acceptance always observes it.
pub struct NodeServer {
    node: NodeDefinition,
    card: AgentCard,
    executor: Arc<dyn NodeExecutor>,
    session: Arc<Session>,
    tasks: Mutex<HashMap<String, Task>>,
}

impl NodeServer {
    /// Create a responder for one node
    pub fn new(
        node: NodeDefinition,
        executor: Arc<dyn NodeExecutor>,
        session: Arc<Session>,
    ) -> Self {
        let card = node.agent_card();
        Self {
            node,
            card,
            executor,
            session,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// The node's capability card, derived once at construction
    pub fn agent_card(&self) -> &AgentCard {
        &self.card
    }

    /// The node this server answers for
    pub fn node(&self) -> &NodeDefinition {
        &self.node
    }

    /// Accept a message, run the executor, and return the terminal task
    ///
    /// The returned task is `Completed` with artifacts, `Failed` with the
    /// executor's error, or `Canceled` if a concurrent cancel won the race.
    pub async fn send_message(
        &self,
        message: Message,
        configuration: Option<SendConfiguration>,
    ) -> FlowResult<Task> {
        let task_id = format!("task-{}", Uuid::now_v7());
        let task = Task::new(&task_id, message.clone())
            .with_context_id(self.session.context_id().to_string());

        // Record the task before any work so status reads observe it
        {
            let mut tasks = self.tasks.lock().await;
            tasks.insert(task_id.clone(), task);
        }
        debug!(node_id = %self.node.id, task_id = %task_id, "task accepted");

        // Move to Working through the table; a cancel that slipped in between
        // wins the race and the executor is never invoked
        {
            let mut tasks = self.tasks.lock().await;
            let entry = tasks
                .get_mut(&task_id)
                .ok_or_else(|| FlowError::TaskNotFound {
                    task_id: task_id.clone(),
                })?;
            if entry.start().is_err() {
                debug!(node_id = %self.node.id, task_id = %task_id, "cancelled before work began");
                return Ok(entry.clone());
            }
        }

        let input = ExecutionInput {
            node: self.node.clone(),
            message,
            upstream: self.session.all_artifacts(),
            accepted_output_modes: configuration
                .map(|c| c.accepted_output_modes)
                .unwrap_or_default(),
        };

        let result = self.executor.execute(input).await;

        let mut tasks = self.tasks.lock().await;
        let entry = tasks
            .get_mut(&task_id)
            .ok_or_else(|| FlowError::TaskNotFound {
                task_id: task_id.clone(),
            })?;
        match result {
            Ok(artifacts) => {
                // A task cancelled while the executor ran stays Canceled
                if entry.complete(artifacts).is_err() {
                    debug!(node_id = %self.node.id, task_id = %task_id, "result discarded, task already terminal");
                }
            }
            Err(error) => {
                warn!(node_id = %self.node.id, task_id = %task_id, error = %error, "executor failed");
                if entry.fail(error).is_err() {
                    debug!(node_id = %self.node.id, task_id = %task_id, "failure discarded, task already terminal");
                }
            }
        }
        Ok(entry.clone())
    }

    /// Get a task by ID
    pub async fn get_task(&self, task_id: &str) -> FlowResult<Task> {
        let tasks = self.tasks.lock().await;
        tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| FlowError::TaskNotFound {
                task_id: task_id.to_string(),
            })
    }

    /// Cancel a task, acknowledging even if it is already terminal
    pub async fn cancel_task(&self, task_id: &str) -> FlowResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let entry = tasks
            .get_mut(task_id)
            .ok_or_else(|| FlowError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;

        match entry.cancel() {
            Ok(()) => debug!(node_id = %self.node.id, task_id, "task cancelled"),
            // Already completed or failed: acknowledge with the terminal task
            Err(FlowError::InvalidStateTransition { .. }) => {
                debug!(node_id = %self.node.id, task_id, "cancel after terminal state, acknowledging");
            }
            Err(other) => return Err(other),
        }
        Ok(entry.clone())
    }
}

impl std::fmt::Debug for NodeServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeServer")
            .field("node", &self.node.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::protocol::{error::TaskError, Artifact, TaskState};

    fn server_with(executor: Arc<dyn NodeExecutor>) -> NodeServer {
        NodeServer::new(
            NodeDefinition::new("n1", "echo"),
            executor,
            Arc::new(Session::new()),
        )
    }

    #[tokio::test]
    async fn test_send_message_completes() {
        let server = server_with(executor_fn(|input: ExecutionInput| async move {
            let text = input.message.first_text().unwrap_or_default().to_string();
            Ok(vec![Artifact::from_text("out", text)])
        }));

        let task = server.send_message(Message::user("hello"), None).await.unwrap();

        assert_eq!(task.state, TaskState::Completed);
        assert_eq!(task.artifacts.as_ref().unwrap()[0].first_text(), Some("hello"));
        assert!(task.context_id.is_some());
    }

    #[tokio::test]
    async fn test_executor_error_becomes_failed_task() {
        let server = server_with(executor_fn(|_input| async {
            Err(TaskError::execution("boom"))
        }));

        let task = server.send_message(Message::user("x"), None).await.unwrap();

        assert_eq!(task.state, TaskState::Failed);
        assert_eq!(task.error.as_ref().unwrap().message, "boom");
        assert!(task.artifacts.is_none());
    }

    #[tokio::test]
    async fn test_executor_invoked_exactly_once_per_task() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let server = server_with(executor_fn(|_input| async {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }));

        server.send_message(Message::user("a"), None).await.unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_task_observes_accepted_task() {
        let server = server_with(executor_fn(|_input| async { Ok(Vec::new()) }));

        let task = server.send_message(Message::user("a"), None).await.unwrap();
        let fetched = server.get_task(&task.id).await.unwrap();
        assert_eq!(fetched.id, task.id);
    }

    #[tokio::test]
    async fn test_get_unknown_task() {
        let server = server_with(executor_fn(|_input| async { Ok(Vec::new()) }));
        let err = server.get_task("ghost").await.unwrap_err();
        assert!(matches!(err, FlowError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_terminal_task_acknowledges() {
        let server = server_with(executor_fn(|_input| async { Ok(Vec::new()) }));

        let task = server.send_message(Message::user("a"), None).await.unwrap();
        assert_eq!(task.state, TaskState::Completed);

        // Cancel after completion is acknowledged, state unchanged
        let acked = server.cancel_task(&task.id).await.unwrap();
        assert_eq!(acked.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_executor_sees_upstream_snapshot() {
        let session = Arc::new(Session::new());
        session.set_artifacts("up", vec![Artifact::from_text("u-1", "ctx")]);

        let server = NodeServer::new(
            NodeDefinition::new("n1", "echo"),
            executor_fn(|input: ExecutionInput| async move {
                let upstream_text = input
                    .upstream
                    .get("up")
                    .and_then(|a| a[0].first_text())
                    .unwrap_or_default()
                    .to_string();
                Ok(vec![Artifact::from_text("out", upstream_text)])
            }),
            session,
        );

        let task = server.send_message(Message::user("x"), None).await.unwrap();
        assert_eq!(task.artifacts.as_ref().unwrap()[0].first_text(), Some("ctx"));
    }
}
