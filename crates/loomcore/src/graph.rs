use crate::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workflow graph as submitted by callers.
///
/// Wire format:
/// `{id, nodes: [{id, type, data: {config, label?, ...literals}}],
///   edges: [{source, target}]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub id: Option<String>,
    pub nodes: Vec<NodeInstance>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl WorkflowGraph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeInstance) -> &mut Self {
        self.nodes.push(node);
        self
    }

    pub fn connect(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.edges.push(Edge {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// One node placed in a graph. `type_id` must resolve in the node registry
/// before execution starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    #[serde(default)]
    pub data: NodeData,
}

impl NodeInstance {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            data: NodeData::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.data.label = Some(label.into());
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.config.insert(key.into(), value.into());
        self
    }

    /// Attach an inline literal. Literals are layered over upstream outputs
    /// during input resolution (they win on key collisions).
    pub fn with_literal(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.literals.insert(key.into(), value.into());
        self
    }

    pub fn label(&self) -> &str {
        self.data.label.as_deref().unwrap_or(&self.id)
    }
}

/// Per-instance payload: static config, an optional display label, and any
/// inline literal values (e.g. manually entered text) captured by the
/// flattened remainder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub config: Record,
    #[serde(flatten)]
    pub literals: Record,
}

/// Directed edge. No port metadata: all upstream outputs are merged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub source: String,
    pub target: String,
}
