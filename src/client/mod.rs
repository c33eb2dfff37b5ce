//! High-level client API for talking to workflow nodes

pub mod builder;
pub mod config;
pub mod node;

pub use builder::ClientBuilder;
pub use config::{ClientConfig, RetryPolicy};
pub use node::{BoxedNodeClient, NodeClient};
