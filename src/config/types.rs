use serde::{Deserialize, Serialize};

use crate::resilience::RetryPolicy;

use super::error::ConfigError;

const DEFAULT_WORKLOAD_SIZE: usize = 100;
const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_MAX_PARALLEL: usize = 5;
const DEFAULT_MAX_TOKENS: u32 = 111;
const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1/";
const DEFAULT_API_KEY_ENV: &str = "NVIDIA_API_KEY";
const DEFAULT_LOG_ROTATE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_ROTATE_KEEP: usize = 5;
const MAX_TRIALS: usize = 10_000;

/// Everything a run needs besides the workload itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvalConfig {
    pub workload_size: usize,
    pub batch_size: usize,
    /// Upper bound on dispatched batches; extra items are dropped
    pub max_batches: Option<usize>,
    pub max_parallel: usize,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub model_ids: Vec<String>,
    pub trials: usize,
    pub retry: RetryPolicy,
    pub endpoint: EndpointConfig,
    pub logging: LoggingConfig,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            workload_size: DEFAULT_WORKLOAD_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_batches: None,
            max_parallel: DEFAULT_MAX_PARALLEL,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            model_ids: vec![
                "meta/llama3-8b-instruct".to_string(),
                "meta/llama3-70b-instruct".to_string(),
            ],
            trials: 1,
            retry: RetryPolicy::defaults(),
            endpoint: EndpointConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EvalConfig {
    /// Rejects values that would fail later at partition or dispatch time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return invalid("batch_size must be positive");
        }
        if self.max_batches == Some(0) {
            return invalid("max_batches must be positive when set");
        }
        if self.max_parallel == 0 {
            return invalid("max_parallel must be positive");
        }
        if self.max_tokens == 0 {
            return invalid("max_tokens must be positive");
        }
        if self.trials == 0 || self.trials > MAX_TRIALS {
            return invalid(format!("trials must be between 1 and {MAX_TRIALS}"));
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be positive");
        }
        if let Some(t) = self.temperature {
            if !t.is_finite() || t < 0.0 {
                return invalid(format!("temperature {t} is out of range"));
            }
        }
        if self.model_ids.is_empty() {
            return invalid("model_ids must name at least one model");
        }
        if let Some(blank) = self.model_ids.iter().position(|id| id.trim().is_empty()) {
            return invalid(format!("model_ids[{blank}] is blank"));
        }
        if self.endpoint.base_url.trim().is_empty() {
            return invalid("endpoint.base_url is empty");
        }
        if self.endpoint.timeout_seconds == Some(0) {
            return invalid("endpoint.timeout_seconds must be positive when set");
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub api_key_env: String,
    pub timeout_seconds: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_seconds: None,
        }
    }
}

impl EndpointConfig {
    /// Reads the key from the configured variable; unset or empty means none.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub path: Option<String>,
    pub rotate_size: u64,
    pub rotate_keep: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            path: None,
            rotate_size: DEFAULT_LOG_ROTATE_SIZE,
            rotate_keep: DEFAULT_LOG_ROTATE_KEEP,
        }
    }
}
