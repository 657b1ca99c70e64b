use serde::{Deserialize, Serialize};

use crate::model::{ModelRequest, ModelResponse};

/// Where in a run a trace was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePosition {
    pub batch: usize,
    /// Workload index of the item; `None` when the whole batch was sent in one call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<usize>,
    pub trial: usize,
}

/// Record of one completed and validated model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub request: ModelRequest,
    pub response: ModelResponse,
    pub model_id: String,
    /// Wall-clock duration of the successful invocation alone
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub position: TracePosition,
    /// Invocations it took, retries included
    #[serde(default = "one")]
    pub attempts: usize,
}

fn one() -> usize {
    1
}

impl Trace {
    pub fn record(
        request: ModelRequest,
        response: ModelResponse,
        model_id: impl Into<String>,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            request,
            response,
            model_id: model_id.into(),
            elapsed_seconds,
            position: TracePosition::default(),
            attempts: 1,
        }
    }

    pub fn with_position(mut self, position: TracePosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn completion_tokens(&self) -> u32 {
        self.response.completion_tokens().unwrap_or_default()
    }
}
