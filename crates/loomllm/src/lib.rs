//! Structured output coercion and generative-model access.
//!
//! Turns free-form model text into schema-validated records, with a static
//! model catalog (alias resolution) and an ordered provider fallback chain.

mod catalog;
mod extract;
pub mod providers;
mod schema;
mod selector;

pub use catalog::{ModelCatalog, ModelDescriptor};
pub use extract::extract_record;
pub use providers::{GenerateRequest, ModelProvider};
pub use schema::{FieldType, RecordSchema};
pub use selector::{Attempt, FallbackResult, GenerateOptions, ModelSelector};
