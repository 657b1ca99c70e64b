use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{error::FanoutError, partition::Batch, trace::Trace};

use super::dispatcher::Dispatcher;

/// Spawns one task per batch and waits for all of them.
///
/// At most `max_parallel` batches run at once. Results arrive in completion
/// order, each holding its batch's traces in call order. The first failing
/// batch aborts the rest; the call only returns once every task has stopped.
pub async fn fan_out<T>(
    dispatcher: Arc<Dispatcher<T>>,
    batches: Vec<Batch<T>>,
    max_parallel: usize,
) -> Result<Vec<Vec<Trace>>, FanoutError>
where
    T: Send + Sync + 'static,
{
    if max_parallel == 0 {
        return Err(FanoutError::PartitionMisconfiguration(
            "max_parallel must be positive".to_string(),
        ));
    }

    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let mut results = Vec::with_capacity(batches.len());
    let mut tasks = JoinSet::new();

    for batch in batches {
        let dispatcher = Arc::clone(&dispatcher);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|err| FanoutError::TaskFailed(err.to_string()))?;
            log::debug!("batch {} started with {} items", batch.index, batch.len());
            dispatcher
                .run_batch(&batch)
                .await
                .map_err(|err| FanoutError::BatchFailed {
                    batch: batch.index,
                    source: Box::new(err),
                })
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined
            .map_err(|err| FanoutError::TaskFailed(err.to_string()))
            .and_then(|result| result);
        match outcome {
            Ok(traces) => results.push(traces),
            Err(err) => {
                log::error!("{err}; aborting {} remaining batches", tasks.len());
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(err);
            }
        }
    }

    Ok(results)
}
