use crate::{Record, RunnerError};
use async_trait::async_trait;

/// Per-invocation metadata handed to a runner.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub execution_id: String,
    pub node_id: String,
    pub label: String,
}

/// The polymorphic execution contract invoked by the scheduler for every
/// node: `run(config, inputs, context) -> output`.
///
/// `config` is the node instance's static configuration (the scheduler
/// injects internal keys prefixed with an underscore, e.g. `_node_def`).
/// `inputs` is the merged record resolved from upstream outputs.
#[async_trait]
pub trait NodeRunner: Send + Sync {
    async fn run(
        &self,
        config: &Record,
        inputs: Record,
        ctx: &RunContext,
    ) -> Result<Record, RunnerError>;
}
