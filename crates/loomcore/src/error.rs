use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Graph validation error: {0}")]
    Graph(#[from] GraphError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Structured output error: {0}")]
    StructuredOutput(#[from] StructuredOutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Fatal, pre-execution graph problems. No node runs when one of these
/// is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Cycle detected in workflow graph")]
    CycleDetected,

    #[error("Edge references missing node: {source_id} -> {target}")]
    DanglingEdge { source_id: String, target: String },

    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),

    #[error("Invalid workflow: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("No runner defined for node type: {0}")]
    NoRunner(String),

    #[error("Bad catalog entry '{id}': {reason}")]
    BadEntry { id: String, reason: String },
}

/// Raised by a runner mid-run. Aborts the remaining execution order;
/// outputs recorded before the failure stay visible in the context.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    StructuredOutput(#[from] StructuredOutputError),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("All providers failed after {attempts} attempts. Last error: {last}")]
    AllProvidersFailed { attempts: usize, last: String },
}

#[derive(Error, Debug)]
pub enum StructuredOutputError {
    #[error("No parseable JSON found in model output")]
    ParseFailed { raw: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{field}' has wrong type, expected {expected}")]
    WrongType { field: String, expected: String },

    #[error("Invalid output schema: {0}")]
    InvalidSchema(String),
}
