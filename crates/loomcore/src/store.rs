use crate::{Record, RunnerError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The shape through which the engine talks to persistent storage backends.
/// Concrete document stores and warehouses live outside this repository.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn upsert(&self, collection: &str, id: &str, data: Record) -> Result<(), RunnerError>;
}

/// In-process store used as the default backend and in tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Record> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert(&self, collection: &str, id: &str, data: Record) -> Result<(), RunnerError> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        Ok(())
    }
}
