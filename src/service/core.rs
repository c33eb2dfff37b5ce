//! Core protocol service implementation

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tower_service::Service;

use crate::{
    codec::Codec,
    protocol::{error::FlowError, operation::Operation},
    service::{FlowRequest, FlowResponse},
    transport::{Transport, TransportRequest},
};

/// Core protocol service that wraps a transport
///
/// Implements the Tower `Service` trait and provides the logic for executing
/// protocol operations over any transport (HTTP, in-process, mock).
pub struct ProtocolService<T> {
    transport: T,
    codec: Arc<dyn Codec>,
}

impl<T> ProtocolService<T>
where
    T: Transport,
{
    /// Create a new protocol service over a transport and codec
    pub fn new(transport: T, codec: Arc<dyn Codec>) -> Self {
        Self { transport, codec }
    }

    /// Build a transport request from an operation
    fn build_transport_request(
        req: &FlowRequest,
        codec: &dyn Codec,
    ) -> Result<TransportRequest, FlowError> {
        let endpoint = req.operation.endpoint();
        let method = req.operation.method();

        let mut transport_req = TransportRequest::new(endpoint, method);

        transport_req = transport_req.header("Content-Type", codec.content_type());
        transport_req = transport_req.header("Accept", codec.content_type());

        for (key, value) in &req.context.metadata {
            transport_req = transport_req.header(key.clone(), value.clone());
        }

        let body = codec.encode_request(&req.operation)?;
        if !body.is_empty() && method != "GET" {
            transport_req = transport_req.body(body);
        }

        Ok(transport_req)
    }

    /// Parse a transport response into a protocol response
    fn parse_transport_response(
        transport_resp: crate::transport::TransportResponse,
        codec: &dyn Codec,
        operation: &Operation,
    ) -> Result<FlowResponse, FlowError> {
        if !transport_resp.is_success() {
            return Err(Self::handle_error_response(&transport_resp));
        }

        codec.decode_response(&transport_resp.body, operation)
    }

    /// Map error responses from the transport onto the error taxonomy
    fn handle_error_response(transport_resp: &crate::transport::TransportResponse) -> FlowError {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&transport_resp.body) {
            if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
                return match transport_resp.status {
                    404 => {
                        if let Some(task_id) = json.get("taskId").and_then(|v| v.as_str()) {
                            FlowError::TaskNotFound {
                                task_id: task_id.to_string(),
                            }
                        } else {
                            FlowError::Protocol(message.to_string())
                        }
                    }
                    400 | 422 => FlowError::Validation(message.to_string()),
                    _ => {
                        FlowError::Transport(format!("HTTP {}: {}", transport_resp.status, message))
                    }
                };
            }
        }

        FlowError::Transport(format!("HTTP error: {}", transport_resp.status))
    }
}

impl<T> Service<FlowRequest> for ProtocolService<T>
where
    T: Transport + Clone,
{
    type Response = FlowResponse;
    type Error = FlowError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: FlowRequest) -> Self::Future {
        let transport = self.transport.clone();
        let codec = self.codec.clone();

        Box::pin(async move {
            let transport_req = Self::build_transport_request(&req, codec.as_ref())?;

            let transport_resp = transport.execute(transport_req).await?;

            let response =
                Self::parse_transport_response(transport_resp, codec.as_ref(), &req.operation)?;

            Ok(response)
        })
    }
}

impl<T> Clone for ProtocolService<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            codec: self.codec.clone(),
        }
    }
}
