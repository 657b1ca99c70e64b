//! Barrier-side merge of per-task traces into reportable statistics.

#[path = "aggregate/stats.rs"]
mod stats;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::trace::Trace;

pub use stats::{Distribution, ModelStats};

/// One `{model, elapsed_seconds}` row for latency charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRecord {
    pub model: String,
    pub elapsed_seconds: f64,
}

/// All traces of a run plus per-model statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResult {
    traces: Vec<Trace>,
    models: BTreeMap<String, ModelStats>,
}

impl AggregatedResult {
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn into_traces(self) -> Vec<Trace> {
        self.traces
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Statistics keyed by model id, in id order.
    pub fn models(&self) -> &BTreeMap<String, ModelStats> {
        &self.models
    }

    pub fn model_stats(&self, model_id: &str) -> Option<&ModelStats> {
        self.models.get(model_id)
    }

    pub fn timings(&self) -> Vec<TimingRecord> {
        self.traces
            .iter()
            .map(|trace| TimingRecord {
                model: trace.model_id.clone(),
                elapsed_seconds: trace.elapsed_seconds,
            })
            .collect()
    }
}

/// Concatenates task results in the order given and groups them by model.
///
/// Task order carries no meaning; the order of traces within each task is kept.
pub fn merge(task_results: Vec<Vec<Trace>>) -> AggregatedResult {
    let traces: Vec<Trace> = task_results.into_iter().flatten().collect();

    let mut grouped: BTreeMap<&str, Vec<&Trace>> = BTreeMap::new();
    for trace in &traces {
        grouped.entry(trace.model_id.as_str()).or_default().push(trace);
    }
    let models = grouped
        .into_iter()
        .map(|(model, group)| (model.to_string(), ModelStats::from_traces(model, &group)))
        .collect();

    AggregatedResult { traces, models }
}
