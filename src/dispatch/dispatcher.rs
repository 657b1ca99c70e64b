use std::sync::Arc;
use std::time::Instant;

use crate::{
    endpoint::{EndpointRegistry, ModelEndpoint},
    error::FanoutError,
    model::ModelRequest,
    partition::Batch,
    resilience::{Retried, RetryPolicy},
    trace::{Trace, TracePosition},
    validation::ResponseContract,
};

use super::shaper::RequestShaper;

/// Runs the model calls of one batch, strictly in order.
///
/// For every trial, every item (or the whole batch for per-batch shaping) is
/// sent to every configured endpoint in list order. Each response is
/// validated before it is recorded; the first failure aborts the batch.
pub struct Dispatcher<T> {
    endpoints: Vec<(String, Arc<dyn ModelEndpoint>)>,
    shaper: RequestShaper<T>,
    retry: RetryPolicy,
    trials: usize,
}

impl<T> Dispatcher<T> {
    /// Resolves `model_ids` against `registry`; unknown ids fail before any call is made.
    pub fn new(
        registry: &EndpointRegistry,
        model_ids: &[String],
        shaper: RequestShaper<T>,
    ) -> Result<Self, FanoutError> {
        if model_ids.is_empty() {
            return Err(FanoutError::InvalidRequest(
                "at least one model id is required".to_string(),
            ));
        }
        Ok(Self {
            endpoints: registry.resolve(model_ids)?,
            shaper,
            retry: RetryPolicy::none(),
            trials: 1,
        })
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Number of times the batch is replayed. Values below one are treated as one.
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = trials.max(1);
        self
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|(id, _)| id.as_str())
    }

    /// Number of calls `run_batch` makes for a batch of `items` items, saturating at `usize::MAX`.
    pub fn calls_for(&self, items: usize) -> usize {
        let per_trial = match self.shaper {
            RequestShaper::PerItem(_) => items,
            RequestShaper::PerBatch(_) => usize::from(items > 0),
        };
        self.trials
            .saturating_mul(per_trial)
            .saturating_mul(self.endpoints.len())
    }

    pub async fn run_batch(&self, batch: &Batch<T>) -> Result<Vec<Trace>, FanoutError> {
        let mut traces = Vec::new();

        for trial in 0..self.trials {
            match &self.shaper {
                RequestShaper::PerItem(build) => {
                    for (i, item) in batch.items.iter().enumerate() {
                        let position = TracePosition {
                            batch: batch.index,
                            item: Some(batch.offset + i),
                            trial,
                        };
                        for (model_id, endpoint) in &self.endpoints {
                            let request = build(item, model_id);
                            let trace = self
                                .invoke(model_id, endpoint.as_ref(), request)
                                .await?;
                            traces.push(trace.with_position(position));
                        }
                    }
                }
                RequestShaper::PerBatch(build) => {
                    if batch.is_empty() {
                        continue;
                    }
                    let position = TracePosition {
                        batch: batch.index,
                        item: None,
                        trial,
                    };
                    for (model_id, endpoint) in &self.endpoints {
                        let request = build(&batch.items, model_id);
                        let trace = self
                            .invoke(model_id, endpoint.as_ref(), request)
                            .await?;
                        traces.push(trace.with_position(position));
                    }
                }
            }
        }

        log::debug!(
            "batch {} finished with {} traces",
            batch.index,
            traces.len()
        );
        Ok(traces)
    }

    async fn invoke(
        &self,
        model_id: &str,
        endpoint: &dyn ModelEndpoint,
        request: ModelRequest,
    ) -> Result<Trace, FanoutError> {
        let req = &request;
        let Retried {
            value: (response, elapsed),
            attempts,
        } = self
            .retry
            .retry(move || async move {
                let started = Instant::now();
                let response = endpoint.call(model_id, req).await?;
                Ok((response, started.elapsed()))
            })
            .await?;

        let elapsed_seconds = elapsed.as_secs_f64();
        log::debug!(
            "{model_id} returned {} tokens to client in {elapsed_seconds:.3} seconds",
            response.completion_tokens().unwrap_or_default()
        );

        ResponseContract::for_request(model_id, &request)
            .validate(&response)
            .map_err(|violation| FanoutError::ContractViolation {
                model_id: model_id.to_string(),
                violation,
            })?;

        Ok(Trace::record(request, response, model_id, elapsed_seconds).with_attempts(attempts))
    }
}
