use crate::registry::NodeRegistry;
use crate::scheduler::{RunnerTable, Scheduler};
use loomcore::{
    ExecutionContext, ExecutionSnapshot, ExecutionState, NodeSummary, RouteTracer, WorkflowGraph,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Engine facade: owns the registry, the scheduler and the map of live and
/// finished executions.
///
/// Submission is fire-and-forget: `submit` returns an execution id
/// immediately and the run proceeds as a background task; callers poll
/// `status`. There is no cancellation and no engine-level timeout.
pub struct Engine {
    registry: Arc<NodeRegistry>,
    scheduler: Arc<Scheduler>,
    tracer: RouteTracer,
    executions: Arc<RwLock<HashMap<String, Arc<RwLock<ExecutionContext>>>>>,
}

impl Engine {
    pub fn new(registry: Arc<NodeRegistry>, runners: RunnerTable) -> Self {
        Self {
            registry,
            scheduler: Arc::new(Scheduler::new(runners)),
            tracer: RouteTracer::new(),
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// The cross-module route tracer, shared with the transport layer.
    pub fn tracer(&self) -> &RouteTracer {
        &self.tracer
    }

    /// Submit a workflow for execution. Returns immediately; the run
    /// (including validation) happens on a background task.
    pub async fn submit(&self, graph: WorkflowGraph) -> String {
        let execution_id = Uuid::new_v4().to_string();
        let context = Arc::new(RwLock::new(ExecutionContext::new(execution_id.clone())));
        self.executions
            .write()
            .await
            .insert(execution_id.clone(), context.clone());

        self.tracer
            .record(
                &execution_id,
                "engine",
                "workflow submitted",
                json!({"workflow_id": graph.id, "node_count": graph.nodes.len()}),
            )
            .await;

        let scheduler = self.scheduler.clone();
        let registry = self.registry.clone();
        let tracer = self.tracer.clone();
        let task_id = execution_id.clone();
        tokio::spawn(async move {
            scheduler.run(&graph, &registry, &context).await;
            let state = context.read().await.state;
            tracer
                .record(
                    &task_id,
                    "engine",
                    "workflow finished",
                    json!({"state": state}),
                )
                .await;
        });

        execution_id
    }

    /// Run a workflow to completion and return the final snapshot. Used by
    /// the CLI and tests; the run is still registered and pollable.
    pub async fn execute(&self, graph: WorkflowGraph) -> ExecutionSnapshot {
        let execution_id = Uuid::new_v4().to_string();
        let context = Arc::new(RwLock::new(ExecutionContext::new(execution_id.clone())));
        self.executions
            .write()
            .await
            .insert(execution_id, context.clone());

        self.scheduler.run(&graph, &self.registry, &context).await;
        let context = context.read().await;
        context.snapshot()
    }

    /// Poll the state of an execution by id.
    pub async fn status(&self, execution_id: &str) -> Option<ExecutionSnapshot> {
        let executions = self.executions.read().await;
        let context = executions.get(execution_id)?;
        let snapshot = Some(context.read().await.snapshot());
        snapshot
    }

    /// Wait until an execution leaves the running state, then return its
    /// snapshot. Intended for tests and CLI polling loops.
    pub async fn wait(&self, execution_id: &str) -> Option<ExecutionSnapshot> {
        loop {
            let snapshot = self.status(execution_id).await?;
            if snapshot.state != ExecutionState::Running {
                return Some(snapshot);
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub fn list_node_types(&self) -> Vec<NodeSummary> {
        self.registry.list_nodes()
    }
}
