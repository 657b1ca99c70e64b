use serde::Serialize;

use crate::trace::Trace;

/// Summary of a sample of values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Distribution {
    /// Returns `None` for an empty sample.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let sum: f64 = sorted.iter().sum();
        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean: sum / sorted.len() as f64,
            p50: nearest_rank(&sorted, 0.50),
            p95: nearest_rank(&sorted, 0.95),
        })
    }
}

/// Nearest-rank percentile of an ascending, non-empty sample.
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Latency and token usage of one model across a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub model: String,
    pub calls: usize,
    pub elapsed_seconds: Distribution,
    pub completion_tokens: Distribution,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
}

impl ModelStats {
    pub(crate) fn from_traces(model: &str, traces: &[&Trace]) -> Self {
        let elapsed: Vec<f64> = traces.iter().map(|t| t.elapsed_seconds).collect();
        let completion: Vec<f64> = traces
            .iter()
            .map(|t| f64::from(t.completion_tokens()))
            .collect();

        let mut stats = Self {
            model: model.to_string(),
            calls: traces.len(),
            elapsed_seconds: Distribution::from_samples(&elapsed).unwrap_or_default(),
            completion_tokens: Distribution::from_samples(&completion).unwrap_or_default(),
            ..Default::default()
        };
        for usage in traces.iter().filter_map(|t| t.response.usage) {
            stats.total_prompt_tokens += u64::from(usage.prompt_tokens);
            stats.total_completion_tokens += u64::from(usage.completion_tokens);
            stats.total_tokens += u64::from(usage.total_tokens);
        }
        stats
    }
}
