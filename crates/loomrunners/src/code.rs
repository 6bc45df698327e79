use async_trait::async_trait;
use loomcore::{NodeDefinition, NodeRunner, Record, RecordExt, RunContext, RunnerError};
use loomllm::{extract_record, RecordSchema};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A reusable processing unit instantiated per node from its config.
#[async_trait]
pub trait CodeNode: Send + Sync {
    async fn process(&self, inputs: Record) -> Result<Record, RunnerError>;
}

impl std::fmt::Debug for dyn CodeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CodeNode")
    }
}

type CodeNodeFactory = fn(&Record) -> Result<Arc<dyn CodeNode>, RunnerError>;

/// Maps a node definition's module name to a constructor. Registration is
/// explicit; an unregistered module is a configuration error at run time,
/// not at graph validation time.
#[derive(Default)]
pub struct CodeNodeTable {
    factories: HashMap<String, CodeNodeFactory>,
}

impl CodeNodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with all built-in code nodes registered.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("nodes.pattern_filter", |config| {
            Ok(Arc::new(PatternFilterNode::from_config(config)?))
        });
        table.register("nodes.structured_output", |config| {
            Ok(Arc::new(StructuredOutputNode::from_config(config)?))
        });
        table
    }

    pub fn register(&mut self, module: &str, factory: CodeNodeFactory) {
        self.factories.insert(module.to_string(), factory);
    }

    pub fn build(&self, module: &str, config: &Record) -> Result<Arc<dyn CodeNode>, RunnerError> {
        let factory = self.factories.get(module).ok_or_else(|| {
            RunnerError::Configuration(format!("No code node registered for module: {module}"))
        })?;
        factory(config)
    }
}

/// Bridges code nodes into the runner contract: reads the node definition
/// the scheduler attached to the config, instantiates the module's node,
/// and delegates.
pub struct CodeNodeRunner {
    table: Arc<CodeNodeTable>,
}

impl CodeNodeRunner {
    pub fn new(table: Arc<CodeNodeTable>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl NodeRunner for CodeNodeRunner {
    async fn run(
        &self,
        config: &Record,
        inputs: Record,
        ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        let definition: NodeDefinition = config
            .get("_node_def")
            .cloned()
            .ok_or_else(|| {
                RunnerError::Configuration("Code node invoked without a definition".into())
            })
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| {
                    RunnerError::Configuration(format!("Malformed node definition: {e}"))
                })
            })?;
        let module = definition.module.ok_or_else(|| {
            RunnerError::Configuration(format!(
                "Node type {} has no module to dispatch to",
                definition.id
            ))
        })?;

        // Engine-internal keys never reach node constructors.
        let node_config: Record = config
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        debug!(node = %ctx.node_id, %module, "code node dispatch");
        let node = self.table.build(&module, &node_config)?;
        node.process(inputs).await
    }
}

/// Regex gate over a single input field. Always emits the match outcome;
/// routing on it is the job of a downstream logic node.
#[derive(Debug)]
pub struct PatternFilterNode {
    pattern: Regex,
    field: String,
}

impl PatternFilterNode {
    pub fn from_config(config: &Record) -> Result<Self, RunnerError> {
        let raw = config.str_or("pattern", ".*");
        let pattern = Regex::new(raw)
            .map_err(|e| RunnerError::Configuration(format!("Invalid pattern {raw:?}: {e}")))?;
        Ok(Self {
            pattern,
            field: config.str_or("field", "text").to_string(),
        })
    }
}

#[async_trait]
impl CodeNode for PatternFilterNode {
    async fn process(&self, inputs: Record) -> Result<Record, RunnerError> {
        let text = inputs
            .get(&self.field)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let matched = self.pattern.is_match(text);

        let mut output = Record::new();
        output.insert("matched".to_string(), json!(matched));
        output.insert("text".to_string(), json!(text));
        output.insert("pattern".to_string(), json!(self.pattern.as_str()));
        Ok(output)
    }
}

/// Coerces upstream model text into a schema-validated record without
/// another model call.
pub struct StructuredOutputNode {
    schema: RecordSchema,
    strict: bool,
}

impl StructuredOutputNode {
    pub fn from_config(config: &Record) -> Result<Self, RunnerError> {
        let raw = config
            .get("schema")
            .ok_or_else(|| RunnerError::Configuration("structured_output requires a schema".into()))?;
        let schema = RecordSchema::from_json_schema(raw).map_err(RunnerError::StructuredOutput)?;
        Ok(Self {
            schema,
            strict: config.bool_or("strict", false),
        })
    }
}

#[async_trait]
impl CodeNode for StructuredOutputNode {
    async fn process(&self, inputs: Record) -> Result<Record, RunnerError> {
        let text = inputs
            .get("result")
            .or_else(|| inputs.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let parsed = extract_record(text).and_then(|mut record| {
            self.schema.validate(&mut record)?;
            Ok(record)
        });

        match parsed {
            Ok(record) => {
                let mut output = Record::new();
                output.insert("parsed".to_string(), Value::Object(record));
                output.insert("valid".to_string(), json!(true));
                output.insert("raw_text".to_string(), json!(text));
                Ok(output)
            }
            Err(e) if self.strict => Err(RunnerError::StructuredOutput(e)),
            Err(_) => {
                let mut output = Record::new();
                output.insert("parsed".to_string(), Value::Null);
                output.insert("valid".to_string(), json!(false));
                output.insert("raw_text".to_string(), json!(text));
                Ok(output)
            }
        }
    }
}
