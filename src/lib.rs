//! # a2a-flow
//!
//! A DAG workflow execution engine speaking an A2A-style protocol.
//!
//! The engine turns a directed acyclic graph of agent nodes into a
//! coordinated set of RPC exchanges: each node invocation is tracked through
//! an explicit task lifecycle, artifacts propagate between nodes through a
//! run-scoped session store, and the first failure anywhere cancels every
//! dependent node.
//!
//! ## Features
//!
//! - **Transport agnostic**: nodes answer over HTTP or in-process through the
//!   same Tower service stack
//! - **Explicit lifecycle**: `Created → Working → {Completed | Failed |
//!   InputRequired}` with checked transitions
//! - **Deterministic cancellation**: one single-fire signal per run;
//!   descendants of a failure are never dispatched
//! - **Typed payloads**: text, file and data parts, exhaustively handled
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_flow::prelude::*;
//! use a2a_flow::server::{executor_fn, ExecutionInput, ExecutorRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = WorkflowDefinition::new("greet")
//!         .with_node(NodeDefinition::new("input", "echo"))
//!         .with_node(
//!             NodeDefinition::new("shout", "uppercase").with_template("{{input}}"),
//!         )
//!         .with_edge("input", "shout");
//!
//!     let executors = ExecutorRegistry::new()
//!         .with("echo", executor_fn(|input: ExecutionInput| async move {
//!             let text = input.message.first_text().unwrap_or_default().to_string();
//!             Ok(vec![Artifact::from_text("out", text)])
//!         }))
//!         .with("uppercase", executor_fn(|input: ExecutionInput| async move {
//!             let text = input.message.first_text().unwrap_or_default().to_uppercase();
//!             Ok(vec![Artifact::from_text("out", text)])
//!         }));
//!
//!     let runner = Runner::new(
//!         workflow,
//!         executors,
//!         EventBus::default(),
//!         RunnerConfig::default(),
//!     )?;
//!
//!     let report = runner.run(Message::user("hello")).await?;
//!     println!("shout: {:?}", report.state_of("shout"));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod events;
pub mod layer;
pub mod protocol;
pub mod runner;
pub mod server;
pub mod service;
pub mod session;
pub mod template;
pub mod transport;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{ClientBuilder, NodeClient, RetryPolicy},
        events::{EventBus, FlowEvent},
        protocol::{
            AgentCard, Artifact, FlowError, Message, Part, Role, Task, TaskError, TaskState,
        },
        runner::{RunFailure, RunReport, Runner, RunnerConfig},
        session::Session,
        template::TemplateResolver,
        workflow::{NodeDefinition, WorkflowDefinition},
    };
}
