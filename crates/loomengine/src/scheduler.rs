use crate::registry::NodeRegistry;
use loomcore::{
    EngineError, ExecutionContext, GraphError, NodeInstance, NodeRunner, Record, RegistryError,
    RunContext, RunnerKind, WorkflowGraph,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Runner variant dispatch table, populated once at startup.
pub type RunnerTable = HashMap<RunnerKind, Arc<dyn NodeRunner>>;

/// Validates a workflow graph, computes a deterministic execution order and
/// drives node execution strictly in that order.
pub struct Scheduler {
    runners: RunnerTable,
}

impl Scheduler {
    pub fn new(runners: RunnerTable) -> Self {
        Self { runners }
    }

    /// Validate the graph and compute its execution order.
    ///
    /// Kahn's algorithm with FIFO tie-breaking: nodes become ready in the
    /// order their in-degree reaches zero (seeded in node-list order), not
    /// by id. A short order means a cycle; nothing executes in that case.
    pub fn validate_and_order(graph: &WorkflowGraph) -> Result<Vec<String>, GraphError> {
        let mut dag: DiGraph<usize, ()> = DiGraph::new();
        let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();

        for (position, node) in graph.nodes.iter().enumerate() {
            if index_of.contains_key(node.id.as_str()) {
                return Err(GraphError::Invalid(format!(
                    "duplicate node id: {}",
                    node.id
                )));
            }
            index_of.insert(node.id.as_str(), dag.add_node(position));
        }

        for edge in &graph.edges {
            let source = *index_of.get(edge.source.as_str()).ok_or_else(|| {
                GraphError::DanglingEdge {
                    source_id: edge.source.clone(),
                    target: edge.target.clone(),
                }
            })?;
            let target = *index_of.get(edge.target.as_str()).ok_or_else(|| {
                GraphError::DanglingEdge {
                    source_id: edge.source.clone(),
                    target: edge.target.clone(),
                }
            })?;
            dag.add_edge(source, target, ());
        }

        // Successors in edge-insertion order; petgraph's neighbor iterator
        // walks edges newest-first, which would flip the tie-break.
        let mut successors: Vec<Vec<NodeIndex>> = vec![Vec::new(); dag.node_count()];
        let mut in_degree: Vec<usize> = vec![0; dag.node_count()];
        for edge in dag.edge_references() {
            successors[edge.source().index()].push(edge.target());
            in_degree[edge.target().index()] += 1;
        }

        let mut queue: VecDeque<NodeIndex> = dag
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .collect();
        let mut order = Vec::with_capacity(graph.nodes.len());

        while let Some(idx) = queue.pop_front() {
            order.push(graph.nodes[dag[idx]].id.clone());
            for &next in &successors[idx.index()] {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != graph.nodes.len() {
            return Err(GraphError::CycleDetected);
        }
        Ok(order)
    }

    /// Run a validated-or-not graph against a fresh context. Terminal state
    /// (completed/failed) is recorded on the context; partial outputs from
    /// nodes that ran before a failure stay visible.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        registry: &NodeRegistry,
        context: &Arc<RwLock<ExecutionContext>>,
    ) {
        let execution_id = context.read().await.execution_id.clone();
        context.write().await.trace(
            "Starting workflow execution",
            json!({"workflow_id": graph.id, "node_count": graph.nodes.len()}),
        );

        let order = match Self::validate_and_order(graph) {
            Ok(order) => order,
            Err(e) => {
                error!(execution_id = %execution_id, error = %e, "Graph validation failed");
                let mut ctx = context.write().await;
                ctx.trace(format!("Workflow failed: {e}"), serde_json::Value::Null);
                ctx.fail(e.to_string());
                return;
            }
        };

        context.write().await.trace(
            format!("Execution order determined: {} nodes", order.len()),
            json!({ "order": order }),
        );

        for node_id in &order {
            // Ordering guarantees the node exists.
            let instance = match graph.find_node(node_id) {
                Some(instance) => instance,
                None => continue,
            };
            if let Err(e) = self
                .execute_node(instance, graph, registry, context, &execution_id)
                .await
            {
                error!(execution_id = %execution_id, node = %node_id, error = %e, "Node failed, aborting execution");
                let mut ctx = context.write().await;
                ctx.trace(format!("Workflow failed: {e}"), serde_json::Value::Null);
                ctx.fail(e.to_string());
                return;
            }
        }

        info!(execution_id = %execution_id, "Workflow completed");
        let mut ctx = context.write().await;
        ctx.trace("Workflow completed successfully", serde_json::Value::Null);
        ctx.complete();
    }

    async fn execute_node(
        &self,
        instance: &NodeInstance,
        graph: &WorkflowGraph,
        registry: &NodeRegistry,
        context: &Arc<RwLock<ExecutionContext>>,
        execution_id: &str,
    ) -> Result<(), EngineError> {
        let label = instance.label().to_string();
        context.write().await.trace(
            format!("Executing: {label}"),
            json!({"node_id": instance.id, "type": instance.type_id}),
        );

        let definition = registry.resolve(&instance.type_id)?;
        let runner = self
            .runners
            .get(&definition.runner)
            .cloned()
            .ok_or_else(|| RegistryError::NoRunner(instance.type_id.clone()))?;

        let inputs = {
            let ctx = context.read().await;
            Self::resolve_inputs(&instance.id, graph, &ctx)
        };

        // Inline literals win over upstream outputs for the same key.
        let mut inputs = inputs;
        for (key, value) in &instance.data.literals {
            inputs.insert(key.clone(), value.clone());
        }

        context
            .write()
            .await
            .trace(format!("Input for {label}"), json!(inputs.clone()));

        let mut config = instance.data.config.clone();
        config.insert("_node_def".to_string(), serde_json::to_value(&definition)?);

        let run_ctx = RunContext {
            execution_id: execution_id.to_string(),
            node_id: instance.id.clone(),
            label: label.clone(),
        };

        info!(node = %instance.id, node_type = %instance.type_id, "Running node");
        let output = runner.run(&config, inputs, &run_ctx).await?;

        let mut ctx = context.write().await;
        ctx.trace(format!("Output from {label}"), json!(output.clone()));
        ctx.set_output(instance.id.clone(), output);
        Ok(())
    }

    /// Merge all upstream outputs for a target node: edges are processed in
    /// the order they appear in the graph's edge list, and on key collision
    /// the later-processed source overwrites the earlier.
    fn resolve_inputs(node_id: &str, graph: &WorkflowGraph, ctx: &ExecutionContext) -> Record {
        let mut inputs = Record::new();
        for edge in graph.edges.iter().filter(|e| e.target == node_id) {
            if let Some(output) = ctx.get_output(&edge.source) {
                for (key, value) in output {
                    inputs.insert(key.clone(), value.clone());
                }
            }
        }
        inputs
    }
}
