//! Workflow definitions
//!
//! A workflow is a set of node definitions plus directed edges forming a DAG.
//! Definitions are plain serde data so they can be loaded from JSON files or
//! built programmatically; `validate` must pass before a run starts.

use std::collections::HashMap;

use petgraph::{algo::is_cyclic_directed, graph::DiGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::protocol::{
    agent::{AgentCard, AgentSkill},
    error::{FlowError, FlowResult},
};

/// Static definition of one workflow node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDefinition {
    /// Node identifier, unique within the workflow
    pub id: String,

    /// Node type, selecting the executor from the registry
    #[serde(rename = "type")]
    pub node_type: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Prompt template with optional `{{node_id}}` references
    ///
    /// When absent, the engine falls back to concatenating upstream text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Node-type-specific configuration
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl NodeDefinition {
    /// Create a new node definition
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            name: None,
            template: None,
            config: Value::Null,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the prompt template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the node configuration
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    /// Remote endpoint URL from the node config, if one is declared
    ///
    /// Nodes without an endpoint are hosted in-process by the engine.
    pub fn endpoint_url(&self) -> Option<Url> {
        self.config
            .get("endpoint")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Derive this node's capability card
    ///
    /// Deterministic over the static definition: the same definition always
    /// yields the same card.
    pub fn agent_card(&self) -> AgentCard {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let description = self
            .config
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Workflow node of type '{}'", self.node_type));
        let url = self
            .endpoint_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("local://{}", self.id));

        AgentCard::new(name, description, url).with_skill(
            AgentSkill::new(self.node_type.clone(), self.node_type.clone())
                .with_tag("workflow-node"),
        )
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDefinition {
    /// Upstream node id
    pub from: String,

    /// Downstream node id
    pub to: String,
}

/// A workflow: nodes plus directed edges forming a DAG
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDefinition {
    /// Workflow identifier
    pub id: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The nodes of the graph
    pub nodes: Vec<NodeDefinition>,

    /// The directed edges of the graph
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

impl WorkflowDefinition {
    /// Create an empty workflow
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a node
    pub fn with_node(mut self, node: NodeDefinition) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a directed edge
    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(EdgeDefinition {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Look up a node by id
    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Direct upstream node ids of `id`, in edge declaration order
    pub fn predecessors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from.as_str())
            .collect()
    }

    /// Direct downstream node ids of `id`, in edge declaration order
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to.as_str())
            .collect()
    }

    /// Validate the definition: unique node ids, known edge endpoints, acyclic
    pub fn validate(&self) -> FlowResult<()> {
        if self.nodes.is_empty() {
            return Err(FlowError::InvalidWorkflow("workflow has no nodes".into()));
        }

        let mut indices = HashMap::new();
        let mut graph = DiGraph::<&str, ()>::new();

        for node in &self.nodes {
            if indices.contains_key(node.id.as_str()) {
                return Err(FlowError::InvalidWorkflow(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            let idx = graph.add_node(node.id.as_str());
            indices.insert(node.id.as_str(), idx);
        }

        for edge in &self.edges {
            let from = indices.get(edge.from.as_str()).ok_or_else(|| {
                FlowError::InvalidWorkflow(format!("edge references unknown node '{}'", edge.from))
            })?;
            let to = indices.get(edge.to.as_str()).ok_or_else(|| {
                FlowError::InvalidWorkflow(format!("edge references unknown node '{}'", edge.to))
            })?;
            if from == to {
                return Err(FlowError::InvalidWorkflow(format!(
                    "self-edge on node '{}'",
                    edge.from
                )));
            }
            graph.add_edge(*from, *to, ());
        }

        if is_cyclic_directed(&graph) {
            return Err(FlowError::InvalidWorkflow(
                "workflow graph contains a cycle".into(),
            ));
        }

        Ok(())
    }

    /// Derive the aggregate capability card for the whole workflow
    ///
    /// One skill per node, in declaration order; deterministic like the
    /// per-node cards.
    pub fn aggregate_card(&self) -> AgentCard {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let mut card = AgentCard::new(
            name,
            format!("Workflow '{}' with {} nodes", self.id, self.nodes.len()),
            format!("local://{}", self.id),
        );
        for node in &self.nodes {
            card = card.with_skill(
                AgentSkill::new(node.id.clone(), node.id.clone())
                    .with_description(format!("Node of type '{}'", node.node_type))
                    .with_tag(node.node_type.clone()),
            );
        }
        card
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn diamond() -> WorkflowDefinition {
        WorkflowDefinition::new("wf")
            .with_node(NodeDefinition::new("input", "input"))
            .with_node(NodeDefinition::new("agentA", "llm"))
            .with_node(NodeDefinition::new("agentB", "llm"))
            .with_node(NodeDefinition::new("output", "output"))
            .with_edge("input", "agentA")
            .with_edge("input", "agentB")
            .with_edge("agentA", "output")
            .with_edge("agentB", "output")
    }

    #[test]
    fn test_valid_diamond() {
        assert!(diamond().validate().is_ok());
    }

    #[test]
    fn test_predecessors_and_successors() {
        let wf = diamond();
        assert_eq!(wf.predecessors("output"), vec!["agentA", "agentB"]);
        assert_eq!(wf.successors("input"), vec!["agentA", "agentB"]);
        assert!(wf.predecessors("input").is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let wf = WorkflowDefinition::new("wf")
            .with_node(NodeDefinition::new("a", "t"))
            .with_node(NodeDefinition::new("b", "t"))
            .with_edge("a", "b")
            .with_edge("b", "a");

        let err = wf.validate().unwrap_err();
        assert!(matches!(err, FlowError::InvalidWorkflow(_)));
    }

    #[test]
    fn test_unknown_edge_endpoint_rejected() {
        let wf = WorkflowDefinition::new("wf")
            .with_node(NodeDefinition::new("a", "t"))
            .with_edge("a", "ghost");

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let wf = WorkflowDefinition::new("wf")
            .with_node(NodeDefinition::new("a", "t"))
            .with_node(NodeDefinition::new("a", "t"));

        assert!(wf.validate().is_err());
    }

    #[test]
    fn test_node_card_is_deterministic() {
        let node = NodeDefinition::new("summarize", "llm")
            .with_config(json!({"description": "Summarizes things"}));

        let card1 = node.agent_card();
        let card2 = node.agent_card();
        assert_eq!(card1, card2);
        assert_eq!(card1.description, "Summarizes things");
        assert_eq!(card1.url, "local://summarize");
    }

    #[test]
    fn test_remote_endpoint_in_card() {
        let node = NodeDefinition::new("remote", "llm")
            .with_config(json!({"endpoint": "https://node.example.com/"}));

        assert!(node.endpoint_url().is_some());
        assert_eq!(node.agent_card().url, "https://node.example.com/");
    }

    #[test]
    fn test_aggregate_card_lists_all_nodes() {
        let card = diamond().aggregate_card();
        assert_eq!(card.skills.len(), 4);
        assert_eq!(card.skills[0].id, "input");
    }

    #[test]
    fn test_definition_round_trips_through_json() {
        let wf = diamond();
        let json = serde_json::to_string(&wf).unwrap();
        let back: WorkflowDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(wf, back);
    }
}
