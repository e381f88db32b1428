//! Configuration file parsing and structures.
//!
//! hearthcmd uses a single TOML file. Every section is optional; a file that
//! only names the completion endpoint is enough to run.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use crate::dispatch::ServiceMatch;
use crate::inventory::Device;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Devices known at startup
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `hearthcmd::resolver = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the tracing filter for this config.
    pub fn targets(&self) -> Targets {
        self.overrides.iter().fold(
            Targets::new().with_default(LevelFilter::from(self.level)),
            |targets, (target, level)| targets.with_target(target.clone(), LevelFilter::from(*level)),
        )
    }
}

fn default_listen() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8566
}

/// HTTP ingress configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_api_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

fn default_max_tokens() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

/// Completion service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    /// Full URL of the completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key given inline; takes priority over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, 0.0 for the most reproducible intents
    #[serde(default)]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    /// Resolve the API key from the config or the environment.
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty())
        })
    }
}

/// Action dispatch configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DispatchConfig {
    /// How the dispatcher picks a service on the matched device
    #[serde(default)]
    pub service_match: ServiceMatch,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return Err(ConfigError::Invalid(format!(
                "completion.temperature must be between 0.0 and 2.0, got {}",
                self.completion.temperature
            )));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
