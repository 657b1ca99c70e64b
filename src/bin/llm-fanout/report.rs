use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

use llm_fanout::{aggregate::TimingRecord, EvalConfig, RunReport};

const SAMPLE_WIDTH: usize = 48;

/// What `--output` and `--json` emit.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub command: &'a str,
    pub config: &'a EvalConfig,
    /// `{model, elapsed_seconds}` rows for latency charts
    pub timings: Vec<TimingRecord>,
    #[serde(flatten)]
    pub report: &'a RunReport,
}

impl<'a> ReportDocument<'a> {
    pub fn new(command: &'a str, config: &'a EvalConfig, report: &'a RunReport) -> Self {
        Self {
            generated_at: Utc::now(),
            command,
            config,
            timings: report.result.timings(),
            report,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.to_json()?)
            .with_context(|| format!("writing report {}", path.display()))
    }
}

/// One row per model: call count, latency and completion tokens, plus a sample answer.
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} traces from {} batches in {:.3}s ({} items dropped by batch cap)",
        report.result.len(),
        report.batches,
        report.wall_seconds,
        report.dropped_items
    );
    let _ = writeln!(
        out,
        "{:<32} {:>6} {:>9} {:>9} {:>9} {:>9} {:>8}  sample",
        "model", "calls", "mean s", "p50 s", "p95 s", "max s", "tokens"
    );
    for (model, stats) in report.result.models() {
        let sample = report
            .result
            .traces()
            .iter()
            .find(|t| &t.model_id == model)
            .and_then(|t| t.response.text())
            .map(|text| shorten(text, SAMPLE_WIDTH))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<32} {:>6} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>8}  {}",
            model,
            stats.calls,
            stats.elapsed_seconds.mean,
            stats.elapsed_seconds.p50,
            stats.elapsed_seconds.p95,
            stats.elapsed_seconds.max,
            stats.total_completion_tokens,
            sample
        );
    }
    out
}

fn shorten(text: &str, width: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= width {
        return flat;
    }
    let mut short: String = flat.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}
