//! End-to-end run: partition, fan out, barrier, merge.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::{
    aggregate::{merge, AggregatedResult},
    config::EvalConfig,
    dispatch::{fan_out, Dispatcher},
    error::FanoutError,
    partition::partition,
};

/// Outcome of [`EvalRun::execute`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub result: AggregatedResult,
    /// Batches actually dispatched
    pub batches: usize,
    pub total_items: usize,
    /// Items cut off by the batch cap
    pub dropped_items: usize,
    pub wall_seconds: f64,
}

/// A configured dispatcher plus the partitioning and parallelism of one run.
pub struct EvalRun<T> {
    dispatcher: Arc<Dispatcher<T>>,
    batch_size: usize,
    max_batches: Option<usize>,
    max_parallel: usize,
}

impl<T> EvalRun<T> {
    pub fn from_config(config: &EvalConfig, dispatcher: Dispatcher<T>) -> Self {
        EvalRunBuilder::new()
            .batch_size(config.batch_size)
            .max_batches(config.max_batches)
            .max_parallel(config.max_parallel)
            .build(dispatcher)
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }
}

impl<T> EvalRun<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Runs the whole workload and waits for every batch.
    ///
    /// Any batch failure fails the run; no partial result is returned.
    pub async fn execute(&self, workload: &[T]) -> Result<RunReport, FanoutError> {
        let started = Instant::now();
        let partition = partition(workload, self.batch_size, self.max_batches)?;
        let batches = partition.batches().len();
        let total_items = partition.total_items();
        let dropped_items = partition.dropped_items();
        let planned = partition
            .batches()
            .iter()
            .map(|batch| self.dispatcher.calls_for(batch.len()))
            .fold(0usize, usize::saturating_add);

        log::info!(
            "dispatching {} items in {batches} batches, {planned} calls, at most {} in parallel",
            total_items - dropped_items,
            self.max_parallel
        );

        let task_results = fan_out(
            Arc::clone(&self.dispatcher),
            partition.into_batches(),
            self.max_parallel,
        )
        .await?;
        let result = merge(task_results);
        let wall_seconds = started.elapsed().as_secs_f64();

        log::info!(
            "run finished: {} traces from {batches} batches in {wall_seconds:.3} seconds",
            result.len()
        );

        Ok(RunReport {
            result,
            batches,
            total_items,
            dropped_items,
            wall_seconds,
        })
    }
}

/// Builder for [`EvalRun`].
#[derive(Debug, Clone)]
pub struct EvalRunBuilder {
    batch_size: usize,
    max_batches: Option<usize>,
    max_parallel: usize,
}

impl Default for EvalRunBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalRunBuilder {
    /// Starts from the config defaults, with parallelism taken from the host.
    pub fn new() -> Self {
        let defaults = EvalConfig::default();
        Self {
            batch_size: defaults.batch_size,
            max_batches: None,
            max_parallel: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(defaults.max_parallel),
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn max_batches(mut self, max_batches: Option<usize>) -> Self {
        self.max_batches = max_batches;
        self
    }

    pub fn max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    /// Bad sizes are reported by [`EvalRun::execute`] before any call is made.
    pub fn build<T>(self, dispatcher: Dispatcher<T>) -> EvalRun<T> {
        EvalRun {
            dispatcher: Arc::new(dispatcher),
            batch_size: self.batch_size,
            max_batches: self.max_batches,
            max_parallel: self.max_parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        dispatch::RequestShaper,
        endpoint::{EndpointRegistry, ModelEndpoint},
        error::ErrorKind,
        model::{ChatMessage, ChatRequest, Choice, ChoiceMessage, ModelRequest, ModelResponse, Usage},
    };

    const MODEL: &str = "meta/llama3-8b-instruct";

    #[derive(Default)]
    struct EchoEndpoint {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelEndpoint for EchoEndpoint {
        async fn call(
            &self,
            model_id: &str,
            request: &ModelRequest,
        ) -> Result<ModelResponse, FanoutError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ModelRequest::Chat(chat) = request else {
                return Err(FanoutError::InvalidRequest("chat only".into()));
            };
            Ok(ModelResponse {
                model: Some(model_id.to_string()),
                choices: vec![Choice {
                    index: 0,
                    message: ChoiceMessage {
                        role: Some("assistant".into()),
                        content: chat.messages.last().map(|m| m.content.clone()),
                    },
                    finish_reason: Some("stop".into()),
                }],
                usage: Some(Usage {
                    prompt_tokens: 5,
                    completion_tokens: 7,
                    total_tokens: 12,
                }),
                ..Default::default()
            })
        }
    }

    fn dispatcher(endpoint: Arc<EchoEndpoint>) -> Dispatcher<String> {
        let registry = EndpointRegistry::builder().register(MODEL, endpoint).build();
        let shaper = RequestShaper::per_item(|prompt: &String, _model: &str| {
            ChatRequest::new(vec![ChatMessage::user().content(prompt.clone()).build()], 111).into()
        });
        Dispatcher::new(&registry, &[MODEL.to_string()], shaper).unwrap()
    }

    fn workload(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("prompt {i}")).collect()
    }

    #[tokio::test]
    async fn executes_whole_workload() {
        let endpoint = Arc::new(EchoEndpoint::default());
        let run = EvalRunBuilder::new()
            .batch_size(4)
            .max_parallel(2)
            .build(dispatcher(endpoint.clone()));

        let report = run.execute(&workload(10)).await.unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.total_items, 10);
        assert_eq!(report.dropped_items, 0);
        assert_eq!(report.result.len(), 10);
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 10);

        let stats = report.result.model_stats(MODEL).unwrap();
        assert_eq!(stats.calls, 10);
        assert_eq!(stats.total_tokens, 120);

        let mut items: Vec<usize> = report
            .result
            .traces()
            .iter()
            .filter_map(|t| t.position.item)
            .collect();
        items.sort_unstable();
        assert_eq!(items, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn batch_cap_drops_tail() {
        let endpoint = Arc::new(EchoEndpoint::default());
        let run = EvalRunBuilder::new()
            .batch_size(3)
            .max_batches(Some(2))
            .max_parallel(4)
            .build(dispatcher(endpoint.clone()));

        let report = run.execute(&workload(10)).await.unwrap();
        assert_eq!(report.batches, 2);
        assert_eq!(report.dropped_items, 4);
        assert_eq!(report.result.len(), 6);
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn misconfiguration_fails_before_any_call() {
        let endpoint = Arc::new(EchoEndpoint::default());
        let run = EvalRunBuilder::new()
            .batch_size(0)
            .build(dispatcher(endpoint.clone()));

        let err = run.execute(&workload(3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn from_config_uses_sizes() {
        let config = EvalConfig {
            batch_size: 5,
            max_parallel: 1,
            ..Default::default()
        };
        let run = EvalRun::from_config(&config, dispatcher(Arc::new(EchoEndpoint::default())));
        let report = run.execute(&workload(12)).await.unwrap();
        assert_eq!(report.batches, 3);
        assert_eq!(report.result.len(), 12);
    }

    #[tokio::test]
    async fn empty_workload_is_empty_report() {
        let run = EvalRunBuilder::new().build(dispatcher(Arc::new(EchoEndpoint::default())));
        let report = run.execute(&[]).await.unwrap();
        assert_eq!(report.batches, 0);
        assert!(report.result.is_empty());
    }
}
