use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::types::EvalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension; no extension means TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("toml") => Ok(Self::Toml),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: EvalConfig,
    pub path: PathBuf,
    pub exists: bool,
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::MissingHome)?;
    Ok(dir.join("llm-fanout").join("config.toml"))
}

/// Parses and validates a config document.
pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<EvalConfig, ConfigError> {
    let config: EvalConfig = match format {
        ConfigFormat::Toml => toml::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
    };
    config.validate()?;
    Ok(config)
}

/// Loads `path_override`, or the default location when none is given.
///
/// A missing default file yields the built-in defaults; a missing explicit
/// file is an error.
pub fn load_config(path_override: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let explicit = path_override.is_some();
    let path = match path_override {
        Some(path) => path,
        None => default_config_path()?,
    };
    let format = ConfigFormat::from_path(&path)?;

    match fs::read_to_string(&path) {
        Ok(contents) => {
            log::debug!("loading config from {}", path.display());
            Ok(LoadedConfig {
                config: parse_config(&contents, format)?,
                path,
                exists: true,
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !explicit => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(LoadedConfig {
                config: EvalConfig::default(),
                path,
                exists: false,
            })
        }
        Err(err) => Err(ConfigError::Io(err)),
    }
}
