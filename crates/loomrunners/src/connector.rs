use async_trait::async_trait;
use loomcore::{DocumentStore, NodeRunner, Record, RecordExt, RunContext, RunnerError};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Performs an external side-effect operation identified by
/// `config.operation`. Failures are caller-visible and not retried.
pub struct ConnectorRunner {
    client: reqwest::Client,
    store: Arc<dyn DocumentStore>,
}

impl ConnectorRunner {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            store,
        }
    }

    async fn http_fetch(&self, config: &Record, inputs: &Record) -> Result<Record, RunnerError> {
        let url = config
            .get("url")
            .or_else(|| inputs.get("url"))
            .and_then(Value::as_str)
            .ok_or_else(|| RunnerError::Configuration("http.fetch requires a url".into()))?;
        let method = config.str_or("method", "GET").to_uppercase();

        info!(%method, url, "connector fetch");

        let request = match method.as_str() {
            "GET" => self.client.get(url),
            "POST" => {
                let mut req = self.client.post(url);
                if let Some(body) = inputs.get("body") {
                    req = req.json(body);
                }
                req
            }
            other => {
                return Err(RunnerError::Configuration(format!(
                    "Unsupported method: {other}"
                )))
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| RunnerError::ExecutionFailed(format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RunnerError::ExecutionFailed(format!("Failed to read response: {e}")))?;

        let mut output = Record::new();
        output.insert("status".to_string(), json!(status));
        // Surface parsed JSON alongside the raw body when the response is JSON.
        if let Ok(data) = serde_json::from_str::<Value>(&body) {
            output.insert("data".to_string(), data);
        }
        output.insert("body".to_string(), json!(body));
        Ok(output)
    }

    async fn store_upsert(
        &self,
        config: &Record,
        inputs: Record,
        ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let collection = config.str_or("collection", "default").to_string();
        let id = config
            .get("id")
            .or_else(|| inputs.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", ctx.execution_id, ctx.node_id));

        self.store.upsert(&collection, &id, inputs).await?;

        let mut output = Record::new();
        output.insert("status".to_string(), json!("success"));
        output.insert("collection".to_string(), json!(collection));
        output.insert("id".to_string(), json!(id));
        Ok(output)
    }
}

#[async_trait]
impl NodeRunner for ConnectorRunner {
    async fn run(
        &self,
        config: &Record,
        inputs: Record,
        ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let operation = config.str_or("operation", "echo");
        match operation {
            "http.fetch" => self.http_fetch(config, &inputs).await,
            "store.upsert" => self.store_upsert(config, inputs, ctx).await,
            "echo" => {
                let mut output = inputs;
                output.insert("status".to_string(), json!("success"));
                Ok(output)
            }
            other => Err(RunnerError::Configuration(format!(
                "Unknown connector operation: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomcore::MemoryStore;

    fn ctx() -> RunContext {
        RunContext {
            execution_id: "exec".into(),
            node_id: "c1".into(),
            label: "Connector".into(),
        }
    }

    #[tokio::test]
    async fn upsert_writes_inputs_to_the_store() {
        let store = MemoryStore::new();
        let runner = ConnectorRunner::new(store.clone());

        let mut config = Record::new();
        config.insert("operation".into(), json!("store.upsert"));
        config.insert("collection".into(), json!("events"));
        config.insert("id".into(), json!("e-1"));

        let mut inputs = Record::new();
        inputs.insert("text".into(), json!("payload"));

        let output = runner.run(&config, inputs, &ctx()).await.unwrap();
        assert_eq!(output["status"], json!("success"));

        let stored = store.get("events", "e-1").await.unwrap();
        assert_eq!(stored["text"], json!("payload"));
    }

    #[tokio::test]
    async fn unknown_operation_is_a_configuration_error() {
        let runner = ConnectorRunner::new(MemoryStore::new());
        let mut config = Record::new();
        config.insert("operation".into(), json!("teleport"));

        let err = runner.run(&config, Record::new(), &ctx()).await.unwrap_err();
        assert!(matches!(err, RunnerError::Configuration(_)));
    }
}
