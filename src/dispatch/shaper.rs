use std::sync::Arc;

use crate::model::ModelRequest;

/// Builds the request for one work item and model id.
pub type ItemRequestFn<T> = dyn Fn(&T, &str) -> ModelRequest + Send + Sync + 'static;

/// Builds one request covering a whole batch for a model id.
pub type BatchRequestFn<T> = dyn Fn(&[T], &str) -> ModelRequest + Send + Sync + 'static;

/// How work items become model requests.
pub enum RequestShaper<T> {
    /// One call per item per endpoint
    PerItem(Arc<ItemRequestFn<T>>),
    /// One call per batch per endpoint, e.g. embedding a chunk of texts
    PerBatch(Arc<BatchRequestFn<T>>),
}

impl<T> RequestShaper<T> {
    pub fn per_item<F>(f: F) -> Self
    where
        F: Fn(&T, &str) -> ModelRequest + Send + Sync + 'static,
    {
        RequestShaper::PerItem(Arc::new(f))
    }

    pub fn per_batch<F>(f: F) -> Self
    where
        F: Fn(&[T], &str) -> ModelRequest + Send + Sync + 'static,
    {
        RequestShaper::PerBatch(Arc::new(f))
    }
}

impl<T> Clone for RequestShaper<T> {
    fn clone(&self) -> Self {
        match self {
            RequestShaper::PerItem(f) => RequestShaper::PerItem(Arc::clone(f)),
            RequestShaper::PerBatch(f) => RequestShaper::PerBatch(Arc::clone(f)),
        }
    }
}
