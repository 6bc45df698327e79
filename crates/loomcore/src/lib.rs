//! Core abstractions for the graphloom engine
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the workflow graph model, node definitions,
//! the execution context, the runner contract and the error taxonomy.

mod agent;
mod context;
mod definition;
mod error;
mod graph;
mod record;
mod runner;
mod store;
mod trace;

pub use agent::{AgentDefinition, AgentLibrary, InMemoryAgentLibrary};
pub use context::{ExecutionContext, ExecutionSnapshot, ExecutionState, TraceEntry};
pub use definition::{
    Catalog, CatalogEntry, ConfigField, NodeCategory, NodeDefinition, NodeSummary, RunnerKind,
};
pub use error::{
    EngineError, GraphError, ProviderError, RegistryError, RunnerError, StructuredOutputError,
};
pub use graph::{Edge, NodeData, NodeInstance, WorkflowGraph};
pub use record::{record, Record, RecordExt};
pub use runner::{NodeRunner, RunContext};
pub use store::{DocumentStore, MemoryStore};
pub use trace::{RouteStep, RouteTraceSummary, RouteTracer};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
