//! In-process transport for engine-hosted nodes
//!
//! Routes serialized protocol requests straight to a [`NodeServer`] in the
//! same process. Requests and responses still travel as encoded bytes, so
//! local execution exercises the same wire contract as a remote node.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    task::{Context, Poll},
};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use url::Url;

use crate::{
    protocol::{
        error::{FlowError, FlowResult},
        message::Message,
        operation::SendConfiguration,
    },
    server::NodeServer,
};

use super::{Transport, TransportRequest, TransportResponse};

/// Routing table from node id to its in-process responder
#[derive(Clone, Default)]
pub struct LocalRouter {
    nodes: Arc<RwLock<HashMap<String, Arc<NodeServer>>>>,
}

impl LocalRouter {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a node server under its node id
    pub fn mount(&self, node_id: impl Into<String>, server: Arc<NodeServer>) {
        let mut nodes = self
            .nodes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        nodes.insert(node_id.into(), server);
    }

    /// Look up a mounted node server
    pub fn get(&self, node_id: &str) -> Option<Arc<NodeServer>> {
        let nodes = self
            .nodes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        nodes.get(node_id).cloned()
    }

    /// Build a transport addressing one mounted node
    pub fn transport(&self, node_id: impl Into<String>) -> FlowResult<LocalTransport> {
        let node_id = node_id.into();
        let base_url: Url = format!("local://{}", node_id)
            .parse()
            .map_err(|e| FlowError::Transport(format!("invalid local url: {}", e)))?;
        Ok(LocalTransport {
            router: self.clone(),
            node_id,
            base_url,
        })
    }
}

impl std::fmt::Debug for LocalRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalRouter").finish()
    }
}

/// Transport bound to one node of the local routing table
#[derive(Clone, Debug)]
pub struct LocalTransport {
    router: LocalRouter,
    node_id: String,
    base_url: Url,
}

#[derive(Deserialize)]
struct SendMessageBody {
    message: Message,
    #[serde(default)]
    configuration: Option<SendConfiguration>,
}

impl LocalTransport {
    fn error_response(status: u16, message: impl Into<String>) -> TransportResponse {
        let body = serde_json::json!({ "message": message.into() });
        TransportResponse::new(status).body(Bytes::from(body.to_string()))
    }

    fn json_response<T: serde::Serialize>(value: &T) -> Result<TransportResponse, FlowError> {
        let body = serde_json::to_vec(value)?;
        Ok(TransportResponse::new(200).body(Bytes::from(body)))
    }

    async fn dispatch(
        &self,
        server: &NodeServer,
        request: TransportRequest,
    ) -> Result<TransportResponse, FlowError> {
        let path = request.endpoint.as_str();
        let method = request.method.as_str();

        match (method, path) {
            ("POST", "/messages") => {
                let body: SendMessageBody = serde_json::from_slice(&request.body)?;
                let task = server.send_message(body.message, body.configuration).await?;
                Self::json_response(&task)
            }
            ("GET", "/.well-known/agent-card.json") => Self::json_response(server.agent_card()),
            ("GET", _) if path.starts_with("/tasks/") => {
                let task_id = &path["/tasks/".len()..];
                match server.get_task(task_id).await {
                    Ok(task) => Self::json_response(&task),
                    Err(FlowError::TaskNotFound { task_id }) => Ok(Self::error_response(
                        404,
                        format!("task not found: {}", task_id),
                    )),
                    Err(other) => Err(other),
                }
            }
            ("POST", _) if path.starts_with("/tasks/") && path.ends_with("/cancel") => {
                let task_id = &path["/tasks/".len()..path.len() - "/cancel".len()];
                match server.cancel_task(task_id).await {
                    Ok(task) => Self::json_response(&task),
                    Err(FlowError::TaskNotFound { task_id }) => Ok(Self::error_response(
                        404,
                        format!("task not found: {}", task_id),
                    )),
                    Err(other) => Err(other),
                }
            }
            _ => Ok(Self::error_response(
                404,
                format!("no route for {} {}", method, path),
            )),
        }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), FlowError>> {
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FlowError> {
        let server = self.router.get(&self.node_id).ok_or_else(|| {
            FlowError::Transport(format!("no node mounted at '{}'", self.node_id))
        })?;
        self.dispatch(&server, request).await
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}
