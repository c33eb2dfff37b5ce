//! Core protocol types and definitions

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod agent;
pub mod error;
pub mod message;
pub mod operation;
pub mod task;

pub use agent::{AgentCard, AgentSkill};
pub use error::{FlowError, FlowResult, TaskError};
pub use message::{Message, Part, Role};
pub use operation::Operation;
pub use task::{Task, TaskState};

/// A named bundle of parts produced by one completed task
///
/// Artifacts are immutable once attached to a task; the engine copies whole
/// artifact lists between tasks and the session store, never individual parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// Unique identifier of the artifact
    #[serde(rename = "artifactId")]
    pub artifact_id: String,

    /// A human readable name for the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// A human readable description of the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Contents of the artifact, ordered; must contain at least one part
    pub parts: Vec<Part>,

    /// Position of this artifact among its task's outputs
    #[serde(default)]
    pub index: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Artifact {
    /// Create a new artifact from its parts
    pub fn new(artifact_id: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            name: None,
            description: None,
            parts,
            index: 0,
            metadata: None,
        }
    }

    /// Create an artifact holding a single text part
    pub fn from_text(artifact_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(artifact_id, vec![Part::text(text)])
    }

    /// Create an artifact holding a single structured data part
    pub fn from_data(artifact_id: impl Into<String>, data: Value) -> Self {
        Self::new(artifact_id, vec![Part::data(data)])
    }

    /// Set the artifact name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the artifact position
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// First text part content, if any
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }

    /// First structured data part, if any
    pub fn first_data(&self) -> Option<&Value> {
        self.parts.iter().find_map(Part::as_data)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_artifact_accessors() {
        let artifact = Artifact::new(
            "a-1",
            vec![
                Part::data(json!({"k": 1})),
                Part::text("hello"),
                Part::text("world"),
            ],
        );

        assert_eq!(artifact.first_text(), Some("hello"));
        assert_eq!(artifact.first_data(), Some(&json!({"k": 1})));
    }

    #[test]
    fn test_artifact_serialization() {
        let artifact = Artifact::from_text("a-1", "out").with_name("result");
        let json = serde_json::to_value(&artifact).unwrap();

        assert_eq!(json["artifactId"], "a-1");
        assert_eq!(json["name"], "result");
        assert_eq!(json["index"], 0);
        assert!(json.get("artifact_id").is_none());
    }
}
