//! Workflow execution runtime
//!
//! This crate provides the node registry, the graph scheduler (validation,
//! deterministic ordering, sequential execution) and the engine facade with
//! fire-and-forget submission and status polling.

mod engine;
mod registry;
mod scheduler;

pub use engine::Engine;
pub use registry::{DefinitionBuilder, NodeRegistry};
pub use scheduler::{RunnerTable, Scheduler};
