//! Orchestration engine
//!
//! Walks a validated workflow DAG, schedules one execution unit per node,
//! owns the run's cancellation signal, and aggregates failure. A node is
//! released only when every direct upstream task is terminal; the first
//! failure anywhere fires a single cancellation signal that skips every
//! not-yet-dispatched node and discards in-flight results.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock},
    time::Duration,
};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    client::{BoxedNodeClient, ClientBuilder, RetryPolicy},
    events::{EventBus, FlowEvent},
    protocol::{
        agent::AgentCard,
        error::{FlowError, FlowResult, TaskError},
        message::Message,
        task::{Task, TaskState},
    },
    server::{ExecutorRegistry, NodeServer},
    session::Session,
    template::TemplateResolver,
    transport::LocalRouter,
    workflow::{NodeDefinition, WorkflowDefinition},
};

/// Tunables for one engine run
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Deadline for a single node's exchange
    pub node_timeout: Duration,

    /// Deadline for the whole run, if any
    pub run_timeout: Option<Duration>,

    /// Retry budget for communication failures on send attempts
    pub retry: RetryPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            node_timeout: Duration::from_secs(60),
            run_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Per-node terminal states and artifacts of one finished run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier of the run
    pub run_id: String,

    /// Final task record of every node in the workflow
    pub tasks: HashMap<String, Task>,
}

impl RunReport {
    /// Terminal state of one node, if it is in the report
    pub fn state_of(&self, node_id: &str) -> Option<TaskState> {
        self.tasks.get(node_id).map(|t| t.state)
    }
}

/// Aggregate failure of a run
///
/// Names the first failing node and wraps its cause; every other per-node
/// failure stays in the report's task records and on the event bus.
#[derive(Debug, Error)]
#[error("workflow failed at node '{node_id}': {source}")]
pub struct RunFailure {
    /// The first node that failed
    pub node_id: String,

    /// The failure that started the cancellation
    #[source]
    pub source: TaskError,

    /// Full per-node status map of the run
    pub report: RunReport,
}

/// The orchestration engine for one workflow
///
/// Constructed per run with an explicit event bus; agent cards are derived
/// once at construction and never change for the lifetime of the run.
pub struct Runner {
    workflow: WorkflowDefinition,
    executors: ExecutorRegistry,
    events: EventBus,
    config: RunnerConfig,
    cards: HashMap<String, AgentCard>,
    workflow_card: AgentCard,
}

impl Runner {
    /// Create an engine for a validated workflow
    ///
    /// Fails if the definition is not a DAG or if a locally-hosted node's
    /// type has no registered executor.
    pub fn new(
        workflow: WorkflowDefinition,
        executors: ExecutorRegistry,
        events: EventBus,
        config: RunnerConfig,
    ) -> FlowResult<Self> {
        workflow.validate()?;

        for node in &workflow.nodes {
            if node.endpoint_url().is_none() && executors.get(&node.node_type).is_none() {
                return Err(FlowError::InvalidWorkflow(format!(
                    "no executor registered for node type '{}' (node '{}')",
                    node.node_type, node.id
                )));
            }
        }

        let cards = workflow
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.agent_card()))
            .collect();
        let workflow_card = workflow.aggregate_card();

        Ok(Self {
            workflow,
            executors,
            events,
            config,
            cards,
            workflow_card,
        })
    }

    /// Per-node capability cards, derived once for this run
    pub fn agent_cards(&self) -> &HashMap<String, AgentCard> {
        &self.cards
    }

    /// Aggregate capability card for the whole workflow
    pub fn workflow_card(&self) -> &AgentCard {
        &self.workflow_card
    }

    /// The event bus this engine emits lifecycle notifications on
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute the workflow to completion
    ///
    /// Returns when every node has reached a terminal state, or when the run
    /// itself times out. On failure the aggregate error names the first
    /// failing node and carries the full per-node report.
    pub async fn run(&self, input: Message) -> Result<RunReport, RunFailure> {
        let session = Arc::new(Session::new());
        let run_id = session.run_id().to_string();
        info!(run_id = %run_id, workflow = %self.workflow.id, "run started");

        let router = LocalRouter::new();
        for node in &self.workflow.nodes {
            if node.endpoint_url().is_some() {
                continue;
            }
            if let Some(executor) = self.executors.get(&node.node_type) {
                let server = NodeServer::new(node.clone(), executor, session.clone());
                router.mount(node.id.clone(), Arc::new(server));
            }
        }

        // Fresh per run: the cancellation signal and the single-fire failure slot
        let cancel = CancellationToken::new();
        let failure: Arc<OnceLock<(String, TaskError)>> = Arc::new(OnceLock::new());
        let resolver = Arc::new(TemplateResolver::new());

        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for node in &self.workflow.nodes {
            let (tx, rx) = watch::channel::<Option<TaskState>>(None);
            senders.insert(node.id.clone(), tx);
            receivers.insert(node.id.clone(), rx);
        }

        let mut join_set: JoinSet<(String, Task)> = JoinSet::new();
        for node in &self.workflow.nodes {
            let upstreams: Vec<(String, watch::Receiver<Option<TaskState>>)> = self
                .workflow
                .predecessors(&node.id)
                .into_iter()
                .map(|id| (id.to_string(), receivers[id].clone()))
                .collect();
            let announce = senders
                .remove(&node.id)
                .unwrap_or_else(|| watch::channel(None).0);

            let ctx = NodeContext {
                node: node.clone(),
                input: input.clone(),
                upstreams,
                announce,
                session: session.clone(),
                router: router.clone(),
                events: self.events.clone(),
                cancel: cancel.clone(),
                failure: failure.clone(),
                resolver: resolver.clone(),
                config: self.config.clone(),
            };
            join_set.spawn(run_node(ctx));
        }
        // Downstream receivers are all cloned into node contexts by now
        drop(receivers);

        let mut tasks: HashMap<String, Task> = HashMap::new();
        let collected = async {
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((node_id, task)) => {
                        tasks.insert(node_id, task);
                    }
                    Err(join_err) => {
                        error!(error = %join_err, "node execution unit aborted");
                    }
                }
            }
        };

        let timed_out = match self.config.run_timeout {
            Some(deadline) => tokio::time::timeout(deadline, collected).await.is_err(),
            None => {
                collected.await;
                false
            }
        };

        if timed_out {
            warn!(run_id = %run_id, "run timed out, cancelling remaining nodes");
            cancel.cancel();
            join_set.abort_all();
            while let Some(joined) = join_set.join_next().await {
                if let Ok((node_id, task)) = joined {
                    tasks.insert(node_id, task);
                }
            }
        }

        // Every node gets a record, even if its execution unit never reported
        for node in &self.workflow.nodes {
            tasks.entry(node.id.clone()).or_insert_with(|| {
                let mut task = Task::bare(format!("task-{}", Uuid::now_v7()))
                    .with_context_id(session.context_id().to_string());
                let _ = task.cancel();
                task
            });
        }

        let report = RunReport { run_id, tasks };

        if timed_out {
            return Err(RunFailure {
                node_id: self.workflow.id.clone(),
                source: TaskError::new("DEADLINE_EXCEEDED", "run timed out"),
                report,
            });
        }

        match failure.get() {
            Some((node_id, source)) => Err(RunFailure {
                node_id: node_id.clone(),
                source: source.clone(),
                report,
            }),
            None => {
                info!(run_id = %report.run_id, "run completed");
                Ok(report)
            }
        }
    }
}

/// Everything one node's execution unit needs
struct NodeContext {
    node: NodeDefinition,
    input: Message,
    upstreams: Vec<(String, watch::Receiver<Option<TaskState>>)>,
    announce: watch::Sender<Option<TaskState>>,
    session: Arc<Session>,
    router: LocalRouter,
    events: EventBus,
    cancel: CancellationToken,
    failure: Arc<OnceLock<(String, TaskError)>>,
    resolver: Arc<TemplateResolver>,
    config: RunnerConfig,
}

impl NodeContext {
    /// Record the run's first failure; only the first caller fires the signal
    fn record_failure(&self, error: TaskError) {
        if self
            .failure
            .set((self.node.id.clone(), error.clone()))
            .is_ok()
        {
            self.events.emit(FlowEvent::WorkflowFailed {
                node_id: self.node.id.clone(),
                error: error.message.clone(),
            });
            self.cancel.cancel();
        }
    }

    /// Synthesize the local `Canceled` record for a node resolved without a result
    fn cancelled_task(&self, task_id: Option<String>) -> Task {
        let id = task_id.unwrap_or_else(|| format!("task-{}", Uuid::now_v7()));
        let mut task = Task::bare(id).with_context_id(self.session.context_id().to_string());
        // Created -> Canceled is always legal
        let _ = task.cancel();
        task
    }

    fn finish_cancelled(&self, task_id: Option<String>) -> (String, Task) {
        self.events.emit(FlowEvent::NodeSkipped {
            node_id: self.node.id.clone(),
        });
        let _ = self.announce.send(Some(TaskState::Canceled));
        (self.node.id.clone(), self.cancelled_task(task_id))
    }

    fn finish_failed(&self, task: Task, error: TaskError) -> (String, Task) {
        self.record_failure(error.clone());
        self.events.emit(FlowEvent::NodeError {
            node_id: self.node.id.clone(),
            error: error.message,
        });
        let _ = self.announce.send(Some(TaskState::Failed));
        (self.node.id.clone(), task)
    }

    /// Build the outbound message: template if configured, else upstream
    /// concatenation; nodes left with no text at all get the run input
    fn build_message(&self) -> Message {
        let text = if let Some(template) = &self.node.template {
            self.resolver.resolve(template, &self.session)
        } else {
            self.upstreams
                .iter()
                .filter_map(|(id, _)| self.session.first_text(id))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut message = if text.is_empty() {
            self.input.clone()
        } else {
            Message::user(text)
        };
        message.context_id = Some(self.session.context_id().to_string());
        message
    }

    fn client(&self) -> FlowResult<BoxedNodeClient> {
        match self.node.endpoint_url() {
            Some(url) => ClientBuilder::new_http(url)
                .with_timeout(self.config.node_timeout)
                .with_retry(self.config.retry.clone())
                .build(),
            None => ClientBuilder::new_local(&self.router, self.node.id.clone())?
                .with_timeout(self.config.node_timeout)
                .with_retry(self.config.retry.clone())
                .build(),
        }
    }
}

/// One node's execution unit, spawned per run
async fn run_node(ctx: NodeContext) -> (String, Task) {
    let node_id = ctx.node.id.clone();

    // Block until every direct upstream task is terminal, or the run is cancelled
    let upstream_states = tokio::select! {
        states = await_upstreams(&ctx) => Some(states),
        _ = ctx.cancel.cancelled() => None,
    };

    // Release point: started strictly precedes this node's terminal event
    ctx.events.emit(FlowEvent::NodeStarted {
        node_id: node_id.clone(),
    });

    let ancestor_blocked = match &upstream_states {
        None => true,
        Some(states) => states
            .iter()
            .any(|(_, s)| matches!(s, TaskState::Failed | TaskState::Canceled)),
    };

    if ancestor_blocked || ctx.cancel.is_cancelled() {
        debug!(node_id = %node_id, "skipped without dispatch");
        return ctx.finish_cancelled(None);
    }

    let message = ctx.build_message();

    let mut client = match ctx.client() {
        Ok(client) => client,
        Err(err) => {
            warn!(node_id = %node_id, error = %err, "could not assemble client");
            let error = err.into_task_error();
            let mut task = Task::bare(format!("task-{}", Uuid::now_v7()))
                .with_context_id(ctx.session.context_id().to_string());
            let _ = task.start();
            let _ = task.fail(error.clone());
            return ctx.finish_failed(task, error);
        }
    };

    // No orphan dispatch: the signal is honored up to the last instant
    if ctx.cancel.is_cancelled() {
        debug!(node_id = %node_id, "cancelled before dispatch");
        return ctx.finish_cancelled(None);
    }

    debug!(node_id = %node_id, "dispatching");
    let outcome = client.send_message(message).await;

    match outcome {
        Ok(task) => match task.state {
            TaskState::Completed => {
                if ctx.cancel.is_cancelled() {
                    // In-flight when the signal fired: result is discarded
                    debug!(node_id = %node_id, task_id = %task.id, "result discarded after cancellation");
                    return ctx.finish_cancelled(Some(task.id));
                }
                // Artifacts become visible strictly before successors are released
                ctx.session.set_artifacts(
                    node_id.clone(),
                    task.artifacts.clone().unwrap_or_default(),
                );
                ctx.events.emit(FlowEvent::NodeCompleted {
                    node_id: node_id.clone(),
                });
                let _ = ctx.announce.send(Some(TaskState::Completed));
                (node_id, task)
            }
            TaskState::Failed => {
                let error = task
                    .error
                    .clone()
                    .unwrap_or_else(|| TaskError::execution("node failed without error detail"));
                ctx.finish_failed(task, error)
            }
            _ => {
                // Cancelled remotely: the remote record already says so
                ctx.events.emit(FlowEvent::NodeSkipped {
                    node_id: node_id.clone(),
                });
                let _ = ctx.announce.send(Some(TaskState::Canceled));
                (node_id, task)
            }
        },
        Err(err) => {
            // Retry budget exhausted or deadline: this node failed
            warn!(node_id = %node_id, error = %err, "exchange failed");
            let error = err.into_task_error();
            let mut task = Task::bare(format!("task-{}", Uuid::now_v7()))
                .with_context_id(ctx.session.context_id().to_string());
            let _ = task.start();
            let _ = task.fail(error.clone());
            ctx.finish_failed(task, error)
        }
    }
}

/// Wait for every direct upstream to announce a terminal state
async fn await_upstreams(ctx: &NodeContext) -> Vec<(String, TaskState)> {
    let waits = ctx.upstreams.iter().map(|(id, rx)| {
        let id = id.clone();
        let mut rx = rx.clone();
        async move {
            loop {
                let current = *rx.borrow_and_update();
                if let Some(state) = current {
                    if state.is_terminal() {
                        return (id, state);
                    }
                }
                if rx.changed().await.is_err() {
                    // Producer vanished without a terminal announcement
                    return (id, TaskState::Canceled);
                }
            }
        }
    });
    futures::future::join_all(waits).await
}
