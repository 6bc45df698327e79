use async_trait::async_trait;
use loomcore::{
    ExecutionState, InMemoryAgentLibrary, MemoryStore, NodeInstance, ProviderError, WorkflowGraph,
};
use loomengine::{Engine, NodeRegistry};
use loomllm::{GenerateRequest, ModelCatalog, ModelDescriptor, ModelProvider, ModelSelector};
use loomrunners::{builtin_builders, default_catalog, default_runners, CodeNodeTable};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Provider that answers every prompt with a canned reply.
struct CannedProvider {
    reply: String,
}

#[async_trait]
impl ModelProvider for CannedProvider {
    fn id(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _req: &GenerateRequest) -> Result<String, ProviderError> {
        Ok(self.reply.clone())
    }
}

fn test_engine(reply: &str) -> Engine {
    let mut models = HashMap::new();
    models.insert(
        "canned-1".to_string(),
        ModelDescriptor {
            provider: "canned".to_string(),
            name: "canned-1".to_string(),
            supports_structured_output: false,
            supports_json_mode: false,
            context_window: 8_192,
        },
    );
    let catalog = ModelCatalog::new(models, HashMap::new(), "canned-1");
    let mut selector = ModelSelector::new(catalog);
    selector.register_provider(Arc::new(CannedProvider {
        reply: reply.to_string(),
    }));

    let agents = Arc::new(InMemoryAgentLibrary::new());
    let mut registry = NodeRegistry::new(agents.clone());
    for (module, builder) in builtin_builders() {
        registry.register_builder(module, builder);
    }
    registry.scan(&default_catalog());

    let runners = default_runners(
        Arc::new(selector),
        agents,
        MemoryStore::new(),
        Arc::new(CodeNodeTable::with_builtins()),
    );
    Engine::new(Arc::new(registry), runners)
}

#[tokio::test]
async fn trigger_agent_condition_pipeline_completes() {
    let engine = test_engine("APPROVED: looks good");

    let mut graph = WorkflowGraph::new("review");
    graph
        .add_node(NodeInstance::new("start", "manual_trigger").with_literal("input", "review this"))
        .add_node(
            NodeInstance::new("reviewer", "ai_agent")
                .with_config("prompt", "You review submissions: {input}"),
        )
        .add_node(
            NodeInstance::new("gate", "condition").with_config("condition", "result contains APPROVED"),
        );
    graph.connect("start", "reviewer").connect("reviewer", "gate");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Completed);
    assert_eq!(snapshot.outputs.len(), 3);
    assert_eq!(snapshot.outputs["start"]["status"], json!("triggered"));
    assert_eq!(
        snapshot.outputs["reviewer"]["result"],
        json!("APPROVED: looks good")
    );
    assert_eq!(snapshot.outputs["gate"]["branch"], json!("true"));
}

#[tokio::test]
async fn agent_with_schema_emits_a_validated_record() {
    let engine = test_engine(r#"{"sentiment": "positive", "confidence": 0.9}"#);

    let mut graph = WorkflowGraph::new("classify");
    graph
        .add_node(NodeInstance::new("start", "manual_trigger").with_literal("input", "great work"))
        .add_node(
            NodeInstance::new("classifier", "ai_agent")
                .with_config("prompt", "Classify the sentiment")
                .with_config(
                    "schema",
                    json!({
                        "properties": {
                            "sentiment": {"type": "string"},
                            "confidence": {"type": "number"}
                        },
                        "required": ["sentiment"]
                    }),
                ),
        );
    graph.connect("start", "classifier");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Completed);
    assert_eq!(
        snapshot.outputs["classifier"]["sentiment"],
        json!("positive")
    );
    assert_eq!(snapshot.outputs["classifier"]["confidence"], json!(0.9));
}

#[tokio::test]
async fn pattern_filter_runs_as_a_code_node() {
    let engine = test_engine("unused");

    let mut graph = WorkflowGraph::new("filter");
    graph
        .add_node(
            NodeInstance::new("start", "manual_trigger").with_literal("text", "ERROR: disk full"),
        )
        .add_node(
            NodeInstance::new("filter", "pattern_filter").with_config("pattern", "^ERROR"),
        )
        .add_node(
            NodeInstance::new("route", "condition").with_config("condition", "matched == true"),
        );
    graph.connect("start", "filter").connect("filter", "route");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Completed);
    assert_eq!(snapshot.outputs["filter"]["matched"], json!(true));
    assert_eq!(snapshot.outputs["filter"]["text"], json!("ERROR: disk full"));
    assert_eq!(snapshot.outputs["route"]["branch"], json!("true"));
}

#[tokio::test]
async fn failing_node_leaves_partial_outputs() {
    let engine = test_engine("unused");

    let mut graph = WorkflowGraph::new("broken");
    graph
        .add_node(NodeInstance::new("start", "manual_trigger"))
        // Invalid regex is a configuration error at node run time.
        .add_node(NodeInstance::new("filter", "pattern_filter").with_config("pattern", "(oops"));
    graph.connect("start", "filter");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Failed);
    assert!(snapshot.outputs.contains_key("start"));
    assert!(!snapshot.outputs.contains_key("filter"));
    assert!(snapshot.error.is_some());
}
