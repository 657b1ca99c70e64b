use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A response that failed a structural or semantic check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    /// The response was produced by a different model than the one requested
    #[error("response model mismatch: expected {expected}, got {}", .actual.as_deref().unwrap_or("<none>"))]
    ModelIdentityMismatch {
        expected: String,
        actual: Option<String>,
    },
    /// Wrong number of completions, embeddings or rankings
    #[error("unexpected completion count: expected {expected}, got {actual}")]
    UnexpectedCompletionCount { expected: usize, actual: usize },
    /// More completion tokens than the request allowed
    #[error("token budget exceeded: {completion_tokens} completion tokens for a budget of {max_tokens}")]
    TokenBudgetExceeded {
        completion_tokens: u32,
        max_tokens: u32,
    },
    /// A token budget was set but the response carried no usage record
    #[error("response carries no usage record")]
    MissingUsage,
    /// Guided (JSON schema) output did not match the schema
    #[error("guided output rejected: {0}")]
    GuidedOutputRejected(String),
}

/// Error types that can occur while partitioning, dispatching or aggregating a run.
#[derive(Debug, Error)]
pub enum FanoutError {
    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Authentication and authorization errors
    #[error("Auth error: {0}")]
    AuthError(String),
    /// The endpoint refused the call because of rate limits
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// Errors returned by the model endpoint
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// API response parsing or format error
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// A response from `model_id` failed validation
    #[error("Contract violation from {model_id}: {violation}")]
    ContractViolation {
        model_id: String,
        violation: ContractViolation,
    },
    /// Batch size, batch cap or fan-out width is not usable
    #[error("Partition misconfiguration: {0}")]
    PartitionMisconfiguration(String),
    /// No endpoint is registered for a model id
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),
    /// Invalid request parameters or format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// A worker task failed and aborted the run
    #[error("Batch {batch} aborted: {source}")]
    BatchFailed {
        batch: usize,
        #[source]
        source: Box<FanoutError>,
    },
    /// A worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    TaskFailed(String),
    /// Retry attempts exceeded
    #[error("Retry attempts exceeded after {attempts} tries: {last_error}")]
    RetryExceeded { attempts: usize, last_error: String },
}

/// Coarse classification of [`FanoutError`] used by retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Http,
    Auth,
    RateLimited,
    Provider,
    ResponseFormat,
    Json,
    Contract,
    Configuration,
    Task,
}

impl FanoutError {
    /// Returns the retry classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FanoutError::HttpError(_) => ErrorKind::Http,
            FanoutError::AuthError(_) => ErrorKind::Auth,
            FanoutError::RateLimited(_) => ErrorKind::RateLimited,
            FanoutError::ProviderError(_) => ErrorKind::Provider,
            FanoutError::ResponseFormatError { .. } => ErrorKind::ResponseFormat,
            FanoutError::JsonError(_) => ErrorKind::Json,
            FanoutError::ContractViolation { .. } => ErrorKind::Contract,
            FanoutError::PartitionMisconfiguration(_)
            | FanoutError::UnknownEndpoint(_)
            | FanoutError::InvalidRequest(_) => ErrorKind::Configuration,
            FanoutError::BatchFailed { source, .. } => source.kind(),
            FanoutError::TaskFailed(_) | FanoutError::RetryExceeded { .. } => ErrorKind::Task,
        }
    }

    /// Returns the contract violation behind this error, looking through batch failures.
    pub fn contract_violation(&self) -> Option<&ContractViolation> {
        match self {
            FanoutError::ContractViolation { violation, .. } => Some(violation),
            FanoutError::BatchFailed { source, .. } => source.contract_violation(),
            _ => None,
        }
    }
}

/// Converts reqwest HTTP errors into FanoutErrors
impl From<reqwest::Error> for FanoutError {
    fn from(err: reqwest::Error) -> Self {
        FanoutError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for FanoutError {
    fn from(err: serde_json::Error) -> Self {
        FanoutError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}
