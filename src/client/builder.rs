//! Client builder for assembling the service stack

use std::sync::Arc;
use std::time::Duration;

use tower::util::BoxService;
use tower_layer::Layer;
use url::Url;

use crate::{
    client::{
        config::{ClientConfig, RetryPolicy},
        node::{BoxedNodeClient, NodeClient},
    },
    codec::{Codec, JsonCodec},
    layer::ValidationLayer,
    protocol::error::FlowError,
    service::ProtocolService,
    transport::{HttpTransport, LocalRouter, LocalTransport, Transport},
};

/// Builder for node clients
///
/// Assembles the Tower stack (validation over the core protocol service over
/// a transport) and returns a configured client.
pub struct ClientBuilder<T: Transport> {
    endpoint: String,
    transport: Option<T>,
    codec: Option<Arc<dyn Codec>>,
    timeout: Duration,
    poll_interval: Option<Duration>,
    retry: RetryPolicy,
}

impl<T: Transport> ClientBuilder<T> {
    /// Start a builder for the given endpoint identity
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport: None,
            codec: None,
            timeout: Duration::from_secs(30),
            poll_interval: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Use a custom transport
    pub fn with_transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom codec
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Set the exchange deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how often non-terminal tasks are polled
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the retry policy for communication failures
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.endpoint.clone())
            .with_timeout(self.timeout)
            .with_retry(self.retry.clone());
        if let Some(interval) = self.poll_interval {
            config.poll_interval = interval;
        }
        config
    }

    /// Build the client with its service stack erased
    ///
    /// The engine holds clients for local and remote nodes side by side, so
    /// the concrete transport type is boxed away.
    pub fn build(self) -> Result<BoxedNodeClient, FlowError> {
        let config = self.config();
        let transport = self.transport.ok_or_else(|| {
            FlowError::Protocol("Transport not configured. Call with_transport()".into())
        })?;
        let codec = self.codec.unwrap_or_else(|| Arc::new(JsonCodec));

        let service = ProtocolService::new(transport, codec);
        let service = ValidationLayer::new().layer(service);

        Ok(NodeClient::new(BoxService::new(service), config))
    }
}

impl ClientBuilder<HttpTransport> {
    /// Builder for a remote node answering over HTTP+JSON
    pub fn new_http(endpoint: Url) -> Self {
        let transport = HttpTransport::new(endpoint.clone());
        Self {
            endpoint: endpoint.to_string(),
            transport: Some(transport),
            codec: Some(Arc::new(JsonCodec)),
            timeout: Duration::from_secs(30),
            poll_interval: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientBuilder<LocalTransport> {
    /// Builder for a node hosted in-process on the given router
    pub fn new_local(router: &LocalRouter, node_id: impl Into<String>) -> Result<Self, FlowError> {
        let node_id = node_id.into();
        let transport = router.transport(&node_id)?;
        Ok(Self {
            endpoint: format!("local://{}", node_id),
            transport: Some(transport),
            codec: Some(Arc::new(JsonCodec)),
            timeout: Duration::from_secs(30),
            poll_interval: None,
            retry: RetryPolicy::default(),
        })
    }
}
