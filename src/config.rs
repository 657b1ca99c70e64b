//! Run configuration, read from TOML, YAML or JSON.

#[path = "config/error.rs"]
mod error;

#[path = "config/types.rs"]
mod types;

#[path = "config/load.rs"]
mod load;


pub use error::ConfigError;
pub use load::{default_config_path, load_config, parse_config, ConfigFormat, LoadedConfig};
pub use types::{EndpointConfig, EvalConfig, LoggingConfig};
