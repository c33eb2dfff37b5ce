//! Node discovery and capability types

use serde::{Deserialize, Serialize};

/// Capability descriptor published by a node acting as a protocol responder
///
/// Cards are derived deterministically from a node's static definition when a
/// run starts and are never mutated for the lifetime of that run. An
/// aggregate card describing the whole workflow is derived the same way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Name of the node
    pub name: String,

    /// Human-readable description of the node
    pub description: String,

    /// Endpoint identity where the node answers protocol requests
    pub url: String,

    /// Card version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// MIME types the node accepts as input
    #[serde(default)]
    pub default_input_modes: Vec<String>,

    /// MIME types the node produces as output
    #[serde(default)]
    pub default_output_modes: Vec<String>,

    /// Skills this node advertises
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a new card with the default text modes
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: None,
            default_input_modes: vec!["text/plain".to_string()],
            default_output_modes: vec!["text/plain".to_string()],
            skills: Vec::new(),
        }
    }

    /// Set the card version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the accepted input modes
    pub fn with_input_modes(mut self, modes: Vec<String>) -> Self {
        self.default_input_modes = modes;
        self
    }

    /// Set the produced output modes
    pub fn with_output_modes(mut self, modes: Vec<String>) -> Self {
        self.default_output_modes = modes;
        self
    }

    /// Add a skill to the card
    pub fn with_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}

/// A unit of capability advertised on an agent card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSkill {
    /// Skill identifier, unique within the card
    pub id: String,

    /// Display name of the skill
    pub name: String,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Free-form classification tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl AgentSkill {
    /// Create a new skill
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: Vec::new(),
        }
    }

    /// Set the skill description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a classification tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_card_creation() {
        let card = AgentCard::new("summarize", "Summarizes upstream text", "local://summarize")
            .with_version("1.0.0")
            .with_skill(AgentSkill::new("summarize", "Summarize").with_tag("text"));

        assert_eq!(card.name, "summarize");
        assert_eq!(card.version, Some("1.0.0".to_string()));
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.default_input_modes, vec!["text/plain".to_string()]);
    }

    #[test]
    fn test_agent_card_serialization() {
        let card = AgentCard::new("Test", "Description", "local://test");

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["name"], "Test");
        assert!(json.get("defaultInputModes").is_some());
        assert!(json.get("default_input_modes").is_none());

        let deserialized: AgentCard = serde_json::from_value(json).unwrap();
        assert_eq!(card, deserialized);
    }
}
