use async_trait::async_trait;
use loomcore::{
    AgentDefinition, AgentLibrary, NodeRunner, Record, RecordExt, RunContext, RunnerError,
};
use loomllm::{GenerateOptions, ModelSelector, RecordSchema};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Executes AI agent nodes.
///
/// The agent definition comes either from the library (`config.agent` names
/// an id) or inline from the node config (`prompt`, optional `schema`).
/// With a schema the model output is coerced into a validated record;
/// without one the raw text is returned under `result`.
pub struct AgentRunner {
    selector: Arc<ModelSelector>,
    agents: Arc<dyn AgentLibrary>,
}

impl AgentRunner {
    pub fn new(selector: Arc<ModelSelector>, agents: Arc<dyn AgentLibrary>) -> Self {
        Self { selector, agents }
    }

    fn definition(&self, config: &Record) -> Result<AgentDefinition, RunnerError> {
        if let Some(agent_id) = config.get("agent").and_then(Value::as_str) {
            return self.agents.get(agent_id).ok_or_else(|| {
                RunnerError::Configuration(format!("Unknown agent: {agent_id}"))
            });
        }
        Ok(AgentDefinition {
            prompt_template: config.str_or("prompt", "You are a helpful assistant.").to_string(),
            output_schema: config.get("schema").cloned().filter(|v| !v.is_null()),
            config: Record::new(),
        })
    }

    fn options(&self, config: &Record, definition: &AgentDefinition) -> GenerateOptions {
        let model = config
            .get("model")
            .or_else(|| definition.config.get("model"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let fallback_models = config
            .get("fallback_models")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        GenerateOptions {
            model,
            system_prompt: None,
            temperature: config.f64_or("temperature", 0.7) as f32,
            max_tokens: config.i64_or("max_tokens", 2048) as u32,
            fallback_models,
        }
    }
}

/// Substitute the input into the prompt template. Some templates carry a
/// placeholder, some do not; without one the input rides only in the user
/// prompt.
fn format_prompt(template: &str, input: &str) -> String {
    if template.contains("{input_data}") {
        template.replace("{input_data}", input)
    } else if template.contains("{input}") {
        template.replace("{input}", input)
    } else {
        template.to_string()
    }
}

#[async_trait]
impl NodeRunner for AgentRunner {
    async fn run(
        &self,
        config: &Record,
        inputs: Record,
        ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let input_text = inputs
            .get("input")
            .or_else(|| inputs.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let definition = self.definition(config)?;
        let mut options = self.options(config, &definition);
        options.system_prompt = Some(format_prompt(&definition.prompt_template, &input_text));

        info!(node = %ctx.node_id, model = ?options.model, structured = definition.output_schema.is_some(), "agent call");

        match &definition.output_schema {
            Some(schema) => {
                let schema = RecordSchema::from_json_schema(schema)
                    .map_err(RunnerError::StructuredOutput)?;
                let result = self
                    .selector
                    .generate_structured_with_attempts(&input_text, &schema, &options)
                    .await
                    .map_err(engine_to_runner)?;
                Ok(result.value)
            }
            None => {
                let text = self.selector.generate(&input_text, &options).await?;
                let mut output = Record::new();
                output.insert("result".to_string(), json!(text));
                Ok(output)
            }
        }
    }
}

fn engine_to_runner(e: loomcore::EngineError) -> RunnerError {
    match e {
        loomcore::EngineError::Provider(p) => RunnerError::Provider(p),
        loomcore::EngineError::StructuredOutput(s) => RunnerError::StructuredOutput(s),
        other => RunnerError::ExecutionFailed(other.to_string()),
    }
}
