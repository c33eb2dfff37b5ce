//! High-level node client

use std::time::Duration;

use tower::util::BoxService;
use tower_service::Service;
use tracing::{debug, warn};

use crate::{
    client::config::ClientConfig,
    protocol::{
        agent::AgentCard,
        error::{FlowError, FlowResult},
        message::Message,
        operation::{Operation, SendConfiguration},
        task::Task,
    },
    service::{FlowRequest, FlowResponse, RequestContext},
};

/// Bound on the best-effort remote cancel issued after a deadline
const CANCEL_GRACE: Duration = Duration::from_millis(500);

/// A node client with its service stack erased, as the engine holds them
pub type BoxedNodeClient = NodeClient<BoxService<FlowRequest, FlowResponse, FlowError>>;

/// Client for one node speaking the workflow protocol
///
/// Wraps a Tower service and provides the protocol operations. `send_message`
/// tracks the created task to a terminal state, bounded by the configured
/// deadline; a remote `Failed` task is returned as data, so callers can tell
/// "could not communicate" apart from "communicated and it failed".
pub struct NodeClient<S> {
    service: S,
    config: ClientConfig,
}

impl<S> NodeClient<S>
where
    S: Service<FlowRequest, Response = FlowResponse, Error = FlowError>,
{
    /// Create a new node client
    pub fn new(service: S, config: ClientConfig) -> Self {
        Self { service, config }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_context(&self) -> RequestContext {
        RequestContext {
            endpoint: self.config.endpoint.clone(),
            timeout: Some(self.config.timeout),
            metadata: Default::default(),
        }
    }

    async fn call(
        service: &mut S,
        context: RequestContext,
        operation: Operation,
    ) -> FlowResult<FlowResponse> {
        let request = FlowRequest::new(operation, context);
        service.call(request).await
    }

    /// One send attempt plus tracking to a terminal state
    ///
    /// Records the task id in `observed` as soon as one is known, so the
    /// caller can issue a best-effort cancel if the deadline cuts this short.
    async fn exchange(
        service: &mut S,
        config: &ClientConfig,
        context: RequestContext,
        message: Message,
        configuration: Option<SendConfiguration>,
        observed: &mut Option<String>,
    ) -> FlowResult<Task> {
        let operation = Operation::SendMessage {
            message,
            configuration,
        };

        let mut attempt = 0u32;
        let mut task = loop {
            match Self::call(service, context.clone(), operation.clone()).await {
                Ok(response) => {
                    break response.into_task().ok_or_else(|| {
                        FlowError::Protocol("Expected task response from send_message".into())
                    })?
                }
                Err(err) if err.is_retryable() && attempt < config.retry.max_retries => {
                    let delay = config.retry.delay_for(attempt);
                    warn!(
                        endpoint = %context.endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "send attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };
        *observed = Some(task.id.clone());

        // Track the task until the remote side reports a terminal state
        while !task.is_terminal() {
            tokio::time::sleep(config.poll_interval).await;
            let response = Self::call(
                service,
                context.clone(),
                Operation::GetTask {
                    task_id: task.id.clone(),
                },
            )
            .await?;
            task = response.into_task().ok_or_else(|| {
                FlowError::Protocol("Expected task response from get_task".into())
            })?;
        }

        Ok(task)
    }

    /// Send a message and return the terminal task
    ///
    /// On timeout, issues a best-effort remote cancel and returns
    /// `FlowError::DeadlineExceeded`.
    pub async fn send_message(&mut self, message: Message) -> FlowResult<Task> {
        self.send_message_with(message, None).await
    }

    /// Send a message with per-call preferences
    pub async fn send_message_with(
        &mut self,
        message: Message,
        configuration: Option<SendConfiguration>,
    ) -> FlowResult<Task> {
        let context = self.build_context();
        let deadline = self.config.timeout;
        let mut observed: Option<String> = None;

        let outcome = tokio::time::timeout(
            deadline,
            Self::exchange(
                &mut self.service,
                &self.config,
                context.clone(),
                message,
                configuration,
                &mut observed,
            ),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                if let Some(task_id) = observed {
                    // Fire-and-forget courtesy; the local outcome is already decided
                    let cancel = Self::call(
                        &mut self.service,
                        context,
                        Operation::CancelTask {
                            task_id: task_id.clone(),
                        },
                    );
                    if tokio::time::timeout(CANCEL_GRACE, cancel).await.is_err() {
                        debug!(task_id = %task_id, "best-effort cancel timed out");
                    }
                }
                Err(FlowError::DeadlineExceeded)
            }
        }
    }

    /// Get a task by ID
    pub async fn get_task(&mut self, task_id: String) -> FlowResult<Task> {
        let context = self.build_context();
        let response = Self::call(
            &mut self.service,
            context,
            Operation::GetTask { task_id },
        )
        .await?;
        response
            .into_task()
            .ok_or_else(|| FlowError::Protocol("Expected task response from get_task".into()))
    }

    /// Cancel a task by ID, returning the acknowledging task record
    pub async fn cancel_task(&mut self, task_id: String) -> FlowResult<Task> {
        let context = self.build_context();
        let response = Self::call(
            &mut self.service,
            context,
            Operation::CancelTask { task_id },
        )
        .await?;
        response
            .into_task()
            .ok_or_else(|| FlowError::Protocol("Expected task response from cancel_task".into()))
    }

    /// Discover node capabilities by fetching its agent card
    pub async fn discover(&mut self) -> FlowResult<AgentCard> {
        let context = self.build_context();
        let response = Self::call(&mut self.service, context, Operation::DiscoverAgent).await?;
        response.into_agent_card().ok_or_else(|| {
            FlowError::Protocol("Expected agent card response from discover".into())
        })
    }
}
