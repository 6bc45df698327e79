use crate::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// An agent definition as consumed by the engine: prompt text, an optional
/// output schema and static config. How these are authored and stored
/// (file layouts, prompt folders) is outside this repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub prompt_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    #[serde(default)]
    pub config: Record,
}

/// Source of agent definitions, keyed by agent id.
pub trait AgentLibrary: Send + Sync {
    fn get(&self, agent_id: &str) -> Option<AgentDefinition>;
}

/// In-process agent library, used as the default source and in tests.
#[derive(Default)]
pub struct InMemoryAgentLibrary {
    agents: RwLock<HashMap<String, AgentDefinition>>,
}

impl InMemoryAgentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, agent_id: impl Into<String>, definition: AgentDefinition) {
        self.agents
            .write()
            .expect("agent library lock poisoned")
            .insert(agent_id.into(), definition);
    }
}

impl AgentLibrary for InMemoryAgentLibrary {
    fn get(&self, agent_id: &str) -> Option<AgentDefinition> {
        self.agents
            .read()
            .expect("agent library lock poisoned")
            .get(agent_id)
            .cloned()
    }
}
