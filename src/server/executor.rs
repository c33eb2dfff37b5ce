//! Node executor contract and registry
//!
//! Executors supply the business logic behind a node: given the resolved
//! message parts and any upstream artifacts, they return artifacts or an
//! error. One implementation exists per node-type variant, selected through
//! a construction-time registry; the engine never inspects node kinds at
//! run time.

use std::{collections::HashMap, future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{
    protocol::{error::TaskError, Artifact, Message},
    workflow::NodeDefinition,
};

/// Everything an executor sees for one invocation
#[derive(Debug, Clone)]
pub struct ExecutionInput {
    /// The static definition of the node being invoked
    pub node: NodeDefinition,

    /// The resolved message for this invocation
    pub message: Message,

    /// Snapshot of upstream artifacts, by producing node id
    pub upstream: HashMap<String, Vec<Artifact>>,

    /// MIME types the caller accepts in produced artifacts
    pub accepted_output_modes: Vec<String>,
}

/// Business logic behind one node type
///
/// Implementations must not block indefinitely; the engine imposes its own
/// timeout above the executor and treats an unresponsive one as a deadline
/// failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Run the node's work for one invocation
    async fn execute(&self, input: ExecutionInput) -> Result<Vec<Artifact>, TaskError>;
}

struct FnExecutor<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> NodeExecutor for FnExecutor<F>
where
    F: Fn(ExecutionInput) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<Artifact>, TaskError>> + Send,
{
    async fn execute(&self, input: ExecutionInput) -> Result<Vec<Artifact>, TaskError> {
        (self.f)(input).await
    }
}

/// Adapt an async closure into a [`NodeExecutor`]
pub fn executor_fn<F, Fut>(f: F) -> Arc<dyn NodeExecutor>
where
    F: Fn(ExecutionInput) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Artifact>, TaskError>> + Send + 'static,
{
    Arc::new(FnExecutor { f })
}

/// Construction-time mapping from node type to executor
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor for a node type, replacing any previous one
    pub fn register(&mut self, node_type: impl Into<String>, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(node_type.into(), executor);
    }

    /// Builder-style registration
    pub fn with(mut self, node_type: impl Into<String>, executor: Arc<dyn NodeExecutor>) -> Self {
        self.register(node_type, executor);
        self
    }

    /// Look up the executor for a node type
    pub fn get(&self, node_type: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(node_type).cloned()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("node_types", &self.executors.keys().collect::<Vec<_>>())
            .finish()
    }
}
