//! Validation layer for protocol requests

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower_layer::Layer;
use tower_service::Service;

use crate::{
    protocol::{error::FlowError, message::Part, operation::Operation},
    service::{FlowRequest, FlowResponse},
};

/// Layer that validates protocol requests before they reach the transport
#[derive(Clone, Debug, Default)]
pub struct ValidationLayer;

impl ValidationLayer {
    /// Create a new validation layer
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ValidationLayer {
    type Service = ValidationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidationService { inner }
    }
}

/// Validation service that wraps an inner service
#[derive(Clone)]
pub struct ValidationService<S> {
    inner: S,
}

impl<S> ValidationService<S> {
    /// Validate a request before dispatch
    fn validate_request(req: &FlowRequest) -> Result<(), FlowError> {
        match &req.operation {
            Operation::SendMessage { message, .. } => {
                if message.parts.is_empty() {
                    return Err(FlowError::Validation(
                        "Message must have at least one part".into(),
                    ));
                }

                for part in &message.parts {
                    match part {
                        Part::Text { text, .. } => {
                            if text.is_empty() {
                                return Err(FlowError::Validation(
                                    "Text part cannot be empty".into(),
                                ));
                            }
                        }
                        Part::File { file } => {
                            if file.name.is_empty() {
                                return Err(FlowError::Validation(
                                    "File name cannot be empty".into(),
                                ));
                            }
                            if file.file_with_uri.is_none() && file.file_with_bytes.is_none() {
                                return Err(FlowError::Validation(
                                    "File must have either URI or bytes content".into(),
                                ));
                            }
                        }
                        Part::Data { .. } => {}
                    }
                }

                Ok(())
            }
            Operation::GetTask { task_id } | Operation::CancelTask { task_id } => {
                if task_id.is_empty() {
                    return Err(FlowError::Validation("Task ID cannot be empty".into()));
                }
                Ok(())
            }
            Operation::DiscoverAgent => Ok(()),
        }
    }
}

impl<S> Service<FlowRequest> for ValidationService<S>
where
    S: Service<FlowRequest, Response = FlowResponse, Error = FlowError>,
    S::Future: Send + 'static,
{
    type Response = FlowResponse;
    type Error = FlowError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: FlowRequest) -> Self::Future {
        if let Err(err) = Self::validate_request(&req) {
            return Box::pin(async move { Err(err) });
        }

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        protocol::message::Message,
        service::RequestContext,
    };

    #[test]
    fn test_empty_text_part_rejected() {
        let mut message = Message::user("ok");
        message.parts = vec![Part::text("")];

        let req = FlowRequest::new(
            Operation::SendMessage {
                message,
                configuration: None,
            },
            RequestContext::default(),
        );

        let err = ValidationService::<()>::validate_request(&req).unwrap_err();
        assert!(matches!(err, FlowError::Validation(_)));
    }

    #[test]
    fn test_empty_task_id_rejected() {
        let req = FlowRequest::new(
            Operation::GetTask {
                task_id: String::new(),
            },
            RequestContext::default(),
        );

        assert!(ValidationService::<()>::validate_request(&req).is_err());
    }

    #[test]
    fn test_valid_message_passes() {
        let req = FlowRequest::new(
            Operation::SendMessage {
                message: Message::user("hello"),
                configuration: None,
            },
            RequestContext::default(),
        );

        assert!(ValidationService::<()>::validate_request(&req).is_ok());
    }
}
