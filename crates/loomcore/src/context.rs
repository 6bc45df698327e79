use crate::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Lifecycle state of one workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Running,
    Completed,
    Failed,
}

/// Append-only audit record for one step of an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Mutable state for a single workflow run.
///
/// Created with `state = Running`; owned exclusively by one execution and
/// mutated only by the scheduler. Transitions to `Completed` once every node
/// in the execution order has run, or to `Failed` on the first error.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub execution_id: String,
    pub state: ExecutionState,
    pub error: Option<String>,
    pub node_outputs: HashMap<String, Record>,
    pub trace: Vec<TraceEntry>,
}

impl ExecutionContext {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            state: ExecutionState::Running,
            error: None,
            node_outputs: HashMap::new(),
            trace: Vec::new(),
        }
    }

    pub fn set_output(&mut self, node_id: impl Into<String>, output: Record) {
        self.node_outputs.insert(node_id.into(), output);
    }

    pub fn get_output(&self, node_id: &str) -> Option<&Record> {
        self.node_outputs.get(node_id)
    }

    /// Append a trace entry. Entries are never removed; they are the audit
    /// record returned to callers for debugging.
    pub fn trace(&mut self, message: impl Into<String>, details: Value) {
        self.trace.push(TraceEntry {
            timestamp: Utc::now(),
            message: message.into(),
            details,
        });
    }

    pub fn complete(&mut self) {
        self.state = ExecutionState::Completed;
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.state = ExecutionState::Failed;
        self.error = Some(error);
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            execution_id: self.execution_id.clone(),
            state: self.state,
            error: self.error.clone(),
            outputs: self.node_outputs.clone(),
            logs: self.trace.clone(),
        }
    }
}

/// Point-in-time view of an execution, returned by status polls.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSnapshot {
    pub execution_id: String,
    pub state: ExecutionState,
    pub error: Option<String>,
    pub outputs: HashMap<String, Record>,
    pub logs: Vec<TraceEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_transitions_and_partial_outputs() {
        let mut ctx = ExecutionContext::new("exec-1");
        assert_eq!(ctx.state, ExecutionState::Running);

        let mut out = Record::new();
        out.insert("x".into(), json!(1));
        ctx.set_output("a", out);
        ctx.fail("boom");

        assert_eq!(ctx.state, ExecutionState::Failed);
        assert_eq!(ctx.error.as_deref(), Some("boom"));
        // Outputs recorded before the failure stay visible.
        assert!(ctx.get_output("a").is_some());
    }

    #[test]
    fn trace_is_append_only() {
        let mut ctx = ExecutionContext::new("exec-2");
        ctx.trace("first", Value::Null);
        ctx.trace("second", json!({"k": 1}));
        assert_eq!(ctx.trace.len(), 2);
        assert_eq!(ctx.trace[0].message, "first");
        assert_eq!(ctx.trace[1].details["k"], json!(1));
    }
}
