//! # Mediator Configuration
//!
//! Layered configuration loaded with the `config` crate:
//!
//! 1. Built-in defaults
//! 2. An optional file (TOML, YAML or JSON, picked by extension)
//! 3. Environment variables prefixed `M3DIATOR_`, nested keys separated by `__`
//!    (e.g. `M3DIATOR_PUBLISH_STRATEGY=spawned`, `M3DIATOR_LOGGING__FORMAT=json`)
//!
//! ```rust,no_run
//! use m3diator::config::MediatorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MediatorConfig::from_env()?;
//! println!("publishing with {:?}", config.publish_strategy);
//! # Ok(())
//! # }
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MediatorError, MediatorResult};
use crate::logging::get_environment;

const ENV_PREFIX: &str = "M3DIATOR";

/// How `publish` drives the handlers of one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStrategy {
    /// All handler futures are polled together on the publishing task
    ///
    /// A panicking handler unwinds through the publish call and drops any
    /// sibling handlers that are still running.
    #[default]
    Concurrent,
    /// Every handler runs in its own tokio task; panics become handler failures
    ///
    /// Panic capture needs `panic = "unwind"` in the final binary's profile.
    Spawned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub environment: String,
    /// `EnvFilter` directive; derived from `environment` when unset
    pub level: Option<String>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: get_environment(),
            level: None,
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorConfig {
    pub publish_strategy: PublishStrategy,
    pub logging: LoggingConfig,
}

impl MediatorConfig {
    /// Defaults overlaid with `M3DIATOR_*` environment variables
    pub fn from_env() -> MediatorResult<Self> {
        Self::load(None)
    }

    /// Defaults, then `path` if given and present, then environment variables
    pub fn load(path: Option<&Path>) -> MediatorResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserialize and validate an already assembled [`Config`]
    pub fn from_config(config: Config) -> MediatorResult<Self> {
        let loaded: MediatorConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> MediatorResult<()> {
        if self.logging.environment.trim().is_empty() {
            return Err(MediatorError::Configuration(
                "logging.environment cannot be empty".to_string(),
            ));
        }
        if let Some(level) = &self.logging.level {
            if level.trim().is_empty() {
                return Err(MediatorError::Configuration(
                    "logging.level cannot be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn with_publish_strategy(mut self, strategy: PublishStrategy) -> Self {
        self.publish_strategy = strategy;
        self
    }
}
