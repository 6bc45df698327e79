use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One recorded routing step.
#[derive(Debug, Clone, Serialize)]
pub struct RouteStep {
    pub timestamp: DateTime<Utc>,
    pub module: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

/// Summary of a recorded trace, newest first in listings.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTraceSummary {
    pub trace_id: String,
    pub timestamp: DateTime<Utc>,
    pub step_count: usize,
    pub first_message: String,
}

/// Cross-module trace store, independent of per-execution traces.
///
/// Records steps for requests that span the module router as well as the
/// graph engine, keyed by a caller-supplied or generated correlation id.
#[derive(Clone, Default)]
pub struct RouteTracer {
    traces: Arc<RwLock<HashMap<String, Vec<RouteStep>>>>,
}

impl RouteTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh correlation id for callers that did not supply one.
    pub fn new_correlation_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn record(
        &self,
        correlation_id: &str,
        module: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) {
        let step = RouteStep {
            timestamp: Utc::now(),
            module: module.into(),
            message: message.into(),
            details,
        };
        self.traces
            .write()
            .await
            .entry(correlation_id.to_string())
            .or_default()
            .push(step);
    }

    pub async fn get(&self, correlation_id: &str) -> Option<Vec<RouteStep>> {
        self.traces.read().await.get(correlation_id).cloned()
    }

    /// List recorded traces, most recent first.
    pub async fn list_recent(&self) -> Vec<RouteTraceSummary> {
        let traces = self.traces.read().await;
        let mut summaries: Vec<RouteTraceSummary> = traces
            .iter()
            .filter(|(_, steps)| !steps.is_empty())
            .map(|(id, steps)| RouteTraceSummary {
                trace_id: id.clone(),
                timestamp: steps[0].timestamp,
                step_count: steps.len(),
                first_message: steps[0].message.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_lists_by_recency() {
        let tracer = RouteTracer::new();
        tracer
            .record("older", "router", "route start", Value::Null)
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        tracer
            .record("newer", "engine", "submitted", Value::Null)
            .await;
        tracer
            .record("newer", "engine", "completed", Value::Null)
            .await;

        let steps = tracer.get("newer").await.unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].message, "submitted");

        let recent = tracer.list_recent().await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].trace_id, "newer");
        assert_eq!(recent[0].step_count, 2);

        assert!(tracer.get("unknown").await.is_none());
    }
}
