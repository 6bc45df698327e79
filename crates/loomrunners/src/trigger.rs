use async_trait::async_trait;
use chrono::Utc;
use loomcore::{NodeRunner, Record, RunContext, RunnerError};
use serde_json::json;

/// Entry-point runner: returns a status marker plus the unmodified inputs.
///
/// The scheduler does not special-case "no incoming edges", so a trigger
/// node is how a graph gets its initial payload (usually inline literals)
/// into circulation.
pub struct TriggerRunner;

#[async_trait]
impl NodeRunner for TriggerRunner {
    async fn run(
        &self,
        _config: &Record,
        inputs: Record,
        _ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let mut output = Record::new();
        output.insert("status".to_string(), json!("triggered"));
        output.insert("triggered_at".to_string(), json!(Utc::now().to_rfc3339()));
        for (key, value) in inputs {
            output.insert(key, value);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn passes_inputs_through_with_status() {
        let mut inputs = Record::new();
        inputs.insert("text".into(), json!("hello"));

        let ctx = RunContext {
            execution_id: "e".into(),
            node_id: "t1".into(),
            label: "Trigger".into(),
        };
        let output = TriggerRunner
            .run(&Record::new(), inputs, &ctx)
            .await
            .unwrap();

        assert_eq!(output["status"], json!("triggered"));
        assert_eq!(output["text"], json!("hello"));
        assert!(output.contains_key("triggered_at"));
    }
}
