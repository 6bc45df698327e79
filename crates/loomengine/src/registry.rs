use loomcore::{
    AgentLibrary, Catalog, CatalogEntry, NodeCategory, NodeDefinition, NodeSummary, RegistryError,
    RunnerKind,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Produces the schema of a code-backed node type. The explicit table of
/// builders replaces reflective module-path loading: every implementation
/// reference a catalog may name is registered here at process start.
pub type DefinitionBuilder = fn() -> NodeDefinition;

/// Registry of node types, loaded from a declarative catalog.
///
/// Loading walks the catalog in order; an entry that fails to resolve is
/// logged and skipped, it never fails the registry as a whole. Rescanning
/// replaces the in-memory set (idempotent, supports dev hot-reload).
pub struct NodeRegistry {
    builders: HashMap<String, DefinitionBuilder>,
    agents: Arc<dyn AgentLibrary>,
    nodes: RwLock<Vec<NodeDefinition>>,
}

impl NodeRegistry {
    pub fn new(agents: Arc<dyn AgentLibrary>) -> Self {
        Self {
            builders: HashMap::new(),
            agents,
            nodes: RwLock::new(Vec::new()),
        }
    }

    /// Register a builder under its implementation reference. Must happen
    /// before the catalog naming it is loaded.
    pub fn register_builder(&mut self, module: impl Into<String>, builder: DefinitionBuilder) {
        let module = module.into();
        info!(module = %module, "Registering node builder");
        self.builders.insert(module, builder);
    }

    /// Load (or re-load) the catalog, replacing the current node set.
    pub fn scan(&self, catalog: &Catalog) {
        let mut loaded = Vec::new();
        for entry in &catalog.nodes {
            match self.load_entry(entry) {
                Ok(definition) => loaded.push(definition),
                Err(e) => warn!(entry = %entry.id, error = %e, "Skipping catalog entry"),
            }
        }
        info!(count = loaded.len(), "Registry scan complete");
        *self.nodes.write().expect("registry lock poisoned") = loaded;
    }

    fn load_entry(&self, entry: &CatalogEntry) -> Result<NodeDefinition, RegistryError> {
        if let Some(module) = &entry.module {
            let builder =
                self.builders
                    .get(module)
                    .copied()
                    .ok_or_else(|| RegistryError::BadEntry {
                        id: entry.id.clone(),
                        reason: format!("no builder registered for module '{module}'"),
                    })?;

            // Instantiate once to obtain the schema, then overlay the
            // catalog's own fields.
            let mut definition = builder();
            definition.id = entry.id.clone();
            definition.module = Some(module.clone());
            if let Some(category) = entry.category {
                definition.category = category;
            }
            if let Some(runner) = entry.runner {
                definition.runner = runner;
            }
            Ok(definition)
        } else if let Some(path) = &entry.path {
            let agent = self.agents.get(path).ok_or_else(|| RegistryError::BadEntry {
                id: entry.id.clone(),
                reason: format!("agent definition '{path}' not found"),
            })?;
            Ok(NodeDefinition {
                id: entry.id.clone(),
                name: entry.id.clone(),
                category: entry.category.unwrap_or(NodeCategory::Agent),
                description: agent
                    .config
                    .get("description")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                runner: entry.runner.unwrap_or(RunnerKind::Agent),
                config_schema: Vec::new(),
                module: None,
            })
        } else {
            Err(RegistryError::BadEntry {
                id: entry.id.clone(),
                reason: "entry has neither 'module' nor 'path'".to_string(),
            })
        }
    }

    /// Resolve a node type id to its definition. Every type id referenced in
    /// a graph must resolve here before execution starts.
    pub fn resolve(&self, type_id: &str) -> Result<NodeDefinition, RegistryError> {
        self.nodes
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|n| n.id == type_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownNodeType(type_id.to_string()))
    }

    /// The successfully loaded subset of the catalog.
    pub fn list_nodes(&self) -> Vec<NodeSummary> {
        self.nodes
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(NodeDefinition::summary)
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().expect("registry lock poisoned").len()
    }
}
