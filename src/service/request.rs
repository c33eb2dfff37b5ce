//! Service request types

use std::{collections::HashMap, time::Duration};

use crate::protocol::operation::Operation;

/// A request to the protocol service
///
/// Wraps an operation with the context needed for execution.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    /// The operation to execute
    pub operation: Operation,

    /// Request context (endpoint, timeout, metadata)
    pub context: RequestContext,
}

impl FlowRequest {
    /// Create a new request
    pub fn new(operation: Operation, context: RequestContext) -> Self {
        Self { operation, context }
    }
}

/// Request context containing metadata and configuration
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Endpoint identity of the target node
    pub endpoint: String,

    /// Request timeout
    pub timeout: Option<Duration>,

    /// Additional metadata headers
    pub metadata: HashMap<String, String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Some(Duration::from_secs(30)),
            metadata: HashMap::new(),
        }
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a metadata header
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout: Some(Duration::from_secs(30)),
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::Message;

    #[test]
    fn test_request_context_creation() {
        let context = RequestContext::new("local://agentA")
            .with_timeout(Duration::from_secs(60))
            .with_metadata("key", "value");

        assert_eq!(context.endpoint, "local://agentA");
        assert_eq!(context.timeout, Some(Duration::from_secs(60)));
        assert_eq!(context.metadata.get("key"), Some(&"value".to_string()));
    }

    #[test]
    fn test_request_creation() {
        let operation = Operation::SendMessage {
            message: Message::user("Test"),
            configuration: None,
        };

        let context = RequestContext::new("local://agentA");
        let request = FlowRequest::new(operation, context);

        assert_eq!(request.context.endpoint, "local://agentA");
    }
}
