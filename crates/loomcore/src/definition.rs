use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category of a node type. A closed set: the registry never infers a
/// category by probing an implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Agent,
    Connector,
    Logic,
    Trigger,
}

/// Which runner variant executes nodes of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    Trigger,
    Logic,
    Connector,
    Agent,
    /// Generic code node: resolves a configured implementation reference
    /// at run time and delegates `process(inputs)` to it.
    Code,
}

impl RunnerKind {
    /// Default runner for a category, used when a catalog entry does not
    /// name one explicitly.
    pub fn for_category(category: NodeCategory) -> Self {
        match category {
            NodeCategory::Agent => RunnerKind::Agent,
            NodeCategory::Connector => RunnerKind::Connector,
            NodeCategory::Logic => RunnerKind::Logic,
            NodeCategory::Trigger => RunnerKind::Trigger,
        }
    }
}

/// One configuration parameter accepted by a node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Static definition of a node type, loaded once at registry startup and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: String,
    pub name: String,
    pub category: NodeCategory,
    #[serde(default)]
    pub description: String,
    pub runner: RunnerKind,
    #[serde(default)]
    pub config_schema: Vec<ConfigField>,
    /// Implementation reference for code-backed nodes; resolved through the
    /// code-node table, never through reflection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl NodeDefinition {
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
            description: self.description.clone(),
        }
    }
}

/// What `list_node_types` returns to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    pub category: NodeCategory,
    pub description: String,
}

/// Catalog consumed by the registry: an ordered list of entries, each either
/// code-backed (`module`) or definition-backed (`path`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub nodes: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    /// Code-backed entries: key into the builder table (`pkg.path.ClassName`
    /// style identifiers are accepted verbatim).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Definition-backed entries: agent definition reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NodeCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerKind>,
}
