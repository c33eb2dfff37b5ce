//! HTTP transport for remote nodes

use std::task::{Context, Poll};

use async_trait::async_trait;
use url::Url;

use crate::protocol::error::FlowError;

use super::{Transport, TransportRequest, TransportResponse};

/// HTTP transport implementation using reqwest
///
/// Implements the HTTP+JSON binding for nodes answering at a remote URL.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a new HTTP transport with a custom reqwest client
    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), FlowError>> {
        // HTTP client is always ready
        Poll::Ready(Ok(()))
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, FlowError> {
        let url = format!("{}{}", self.base_url, request.endpoint.trim_start_matches('/'));

        let mut req_builder = match request.method.as_str() {
            "POST" => self.client.post(&url),
            "GET" => self.client.get(&url),
            "PUT" => self.client.put(&url),
            "DELETE" => self.client.delete(&url),
            _ => {
                return Err(FlowError::Transport(format!(
                    "Unsupported HTTP method: {}",
                    request.method
                )))
            }
        };

        for (key, value) in request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let mut transport_resp = TransportResponse::new(status);

        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                transport_resp = transport_resp.header(key.as_str(), value_str);
            }
        }

        let body = response.bytes().await?;
        Ok(transport_resp.body(body))
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }
}
