use async_trait::async_trait;
use loomcore::{
    Catalog, CatalogEntry, ExecutionState, GraphError, InMemoryAgentLibrary, NodeCategory,
    NodeDefinition, NodeInstance, NodeRunner, Record, RunContext, RunnerError, RunnerKind,
    WorkflowGraph,
};
use loomengine::{Engine, NodeRegistry, RunnerTable, Scheduler};
use serde_json::json;
use std::sync::Arc;

/// Emits its own config (minus engine-internal keys) as output.
struct EmitRunner;

#[async_trait]
impl NodeRunner for EmitRunner {
    async fn run(
        &self,
        config: &Record,
        _inputs: Record,
        _ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        Ok(config
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Echoes its resolved inputs as output.
struct EchoRunner;

#[async_trait]
impl NodeRunner for EchoRunner {
    async fn run(
        &self,
        _config: &Record,
        inputs: Record,
        _ctx: &RunContext,
    ) -> Result<Record, RunnerError> {
        Ok(inputs)
    }
}

fn emit_definition() -> NodeDefinition {
    NodeDefinition {
        id: "emit".to_string(),
        name: "Emit".to_string(),
        category: NodeCategory::Trigger,
        description: String::new(),
        runner: RunnerKind::Trigger,
        config_schema: Vec::new(),
        module: None,
    }
}

fn echo_definition() -> NodeDefinition {
    NodeDefinition {
        id: "echo".to_string(),
        name: "Echo".to_string(),
        category: NodeCategory::Logic,
        description: String::new(),
        runner: RunnerKind::Logic,
        config_schema: Vec::new(),
        module: None,
    }
}

fn entry(id: &str, module: &str) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        module: Some(module.to_string()),
        path: None,
        category: None,
        runner: None,
    }
}

fn test_engine() -> Engine {
    let mut registry = NodeRegistry::new(Arc::new(InMemoryAgentLibrary::new()));
    registry.register_builder("test.emit", emit_definition as fn() -> NodeDefinition);
    registry.register_builder("test.echo", echo_definition as fn() -> NodeDefinition);
    registry.scan(&Catalog {
        nodes: vec![entry("emit", "test.emit"), entry("echo", "test.echo")],
    });

    let mut runners: RunnerTable = RunnerTable::new();
    runners.insert(RunnerKind::Trigger, Arc::new(EmitRunner));
    runners.insert(RunnerKind::Logic, Arc::new(EchoRunner));
    Engine::new(Arc::new(registry), runners)
}

#[test]
fn order_respects_edges() {
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("c", "echo"))
        .add_node(NodeInstance::new("a", "emit"))
        .add_node(NodeInstance::new("b", "echo"));
    graph.connect("a", "b").connect("b", "c");

    let order = Scheduler::validate_and_order(&graph).unwrap();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn ties_break_in_node_list_order() {
    // No edges: every node is ready at once, so the order is the node list.
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("z", "emit"))
        .add_node(NodeInstance::new("a", "emit"))
        .add_node(NodeInstance::new("m", "emit"));

    let order = Scheduler::validate_and_order(&graph).unwrap();
    assert_eq!(order, vec!["z", "a", "m"]);
}

#[test]
fn nodes_become_ready_in_edge_release_order() {
    // Diamond: t releases x then y; both must run before the join.
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("t", "emit"))
        .add_node(NodeInstance::new("y", "echo"))
        .add_node(NodeInstance::new("x", "echo"))
        .add_node(NodeInstance::new("join", "echo"));
    graph
        .connect("t", "x")
        .connect("t", "y")
        .connect("x", "join")
        .connect("y", "join");

    let order = Scheduler::validate_and_order(&graph).unwrap();
    assert_eq!(order, vec!["t", "x", "y", "join"]);
}

#[test]
fn cycle_is_a_validation_error() {
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("a", "emit"))
        .add_node(NodeInstance::new("b", "echo"));
    graph.connect("a", "b").connect("b", "a");

    assert!(matches!(
        Scheduler::validate_and_order(&graph),
        Err(GraphError::CycleDetected)
    ));
}

#[test]
fn dangling_edge_is_a_validation_error() {
    let mut graph = WorkflowGraph::new("wf");
    graph.add_node(NodeInstance::new("a", "emit"));
    graph.connect("a", "ghost");

    assert!(matches!(
        Scheduler::validate_and_order(&graph),
        Err(GraphError::DanglingEdge { target, .. }) if target == "ghost"
    ));
}

#[test]
fn duplicate_node_id_is_rejected() {
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("a", "emit"))
        .add_node(NodeInstance::new("a", "echo"));

    assert!(matches!(
        Scheduler::validate_and_order(&graph),
        Err(GraphError::Invalid(_))
    ));
}

#[tokio::test]
async fn cyclic_graph_fails_with_no_node_outputs() {
    let engine = test_engine();
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("a", "emit"))
        .add_node(NodeInstance::new("b", "echo"));
    graph.connect("a", "b").connect("b", "a");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Failed);
    assert!(snapshot.outputs.is_empty());
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn later_edges_win_key_collisions() {
    let engine = test_engine();
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("a", "emit").with_config("x", json!(1)))
        .add_node(NodeInstance::new("b", "emit").with_config("x", json!(2)))
        .add_node(NodeInstance::new("c", "echo"));
    graph.connect("a", "c").connect("b", "c");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Completed);
    assert_eq!(snapshot.outputs["c"]["x"], json!(2));
}

#[tokio::test]
async fn inline_literals_override_upstream_outputs() {
    let engine = test_engine();
    let mut graph = WorkflowGraph::new("wf");
    graph
        .add_node(NodeInstance::new("a", "emit").with_config("x", json!(1)))
        .add_node(NodeInstance::new("b", "echo").with_literal("x", json!(9)));
    graph.connect("a", "b");

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.outputs["b"]["x"], json!(9));
}

#[tokio::test]
async fn unknown_node_type_fails_the_run() {
    let engine = test_engine();
    let mut graph = WorkflowGraph::new("wf");
    graph.add_node(NodeInstance::new("a", "not_registered"));

    let snapshot = engine.execute(graph).await;
    assert_eq!(snapshot.state, ExecutionState::Failed);
}

#[tokio::test]
async fn submit_is_pollable_and_traced() {
    let engine = test_engine();
    let mut graph = WorkflowGraph::new("wf");
    graph.add_node(NodeInstance::new("a", "emit").with_config("x", json!(1)));

    let execution_id = engine.submit(graph).await;
    let snapshot = engine.wait(&execution_id).await.unwrap();
    assert_eq!(snapshot.state, ExecutionState::Completed);
    assert_eq!(snapshot.outputs["a"]["x"], json!(1));

    let route = engine.tracer().get(&execution_id).await.unwrap();
    assert!(route.len() >= 2);
    assert_eq!(route[0].message, "workflow submitted");
}
