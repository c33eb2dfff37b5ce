//! Serialization codecs for protocol bindings

pub mod json;

pub use json::JsonCodec;

use crate::{
    protocol::{error::FlowError, operation::Operation},
    service::response::FlowResponse,
};
use bytes::Bytes;

/// Codec trait for encoding and decoding protocol messages
///
/// Different codecs implement different protocol bindings; the engine ships
/// the HTTP+JSON binding and keeps the seam open for others.
pub trait Codec: Send + Sync {
    /// Serialize an operation to bytes for transport
    fn encode_request(&self, operation: &Operation) -> Result<Bytes, FlowError>;

    /// Deserialize transport response bytes to a protocol response
    ///
    /// The original operation is passed for context, since the wire shape of
    /// the response depends on what was asked.
    fn decode_response(
        &self,
        body: &[u8],
        operation: &Operation,
    ) -> Result<FlowResponse, FlowError>;

    /// Get the content type for this codec
    fn content_type(&self) -> &str;
}
