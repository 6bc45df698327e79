//! Runner variants for the graphloom engine
//!
//! One implementation of the `NodeRunner` contract per node category, plus
//! the code-node dispatch table and the builtin node-type catalog.

mod agent;
mod builtin;
mod code;
mod connector;
mod logic;
mod trigger;

pub use agent::AgentRunner;
pub use builtin::{builtin_builders, default_catalog};
pub use code::{CodeNode, CodeNodeRunner, CodeNodeTable, PatternFilterNode, StructuredOutputNode};
pub use connector::ConnectorRunner;
pub use logic::LogicRunner;
pub use trigger::TriggerRunner;

use loomcore::{AgentLibrary, DocumentStore, NodeRunner, RunnerKind};
use loomllm::ModelSelector;
use std::collections::HashMap;
use std::sync::Arc;

/// Build the dispatch table of all runner variants.
pub fn default_runners(
    selector: Arc<ModelSelector>,
    agents: Arc<dyn AgentLibrary>,
    store: Arc<dyn DocumentStore>,
    code_nodes: Arc<CodeNodeTable>,
) -> HashMap<RunnerKind, Arc<dyn NodeRunner>> {
    let mut runners: HashMap<RunnerKind, Arc<dyn NodeRunner>> = HashMap::new();
    runners.insert(RunnerKind::Trigger, Arc::new(TriggerRunner));
    runners.insert(RunnerKind::Logic, Arc::new(LogicRunner));
    runners.insert(RunnerKind::Connector, Arc::new(ConnectorRunner::new(store)));
    runners.insert(RunnerKind::Agent, Arc::new(AgentRunner::new(selector, agents)));
    runners.insert(RunnerKind::Code, Arc::new(CodeNodeRunner::new(code_nodes)));
    runners
}
