//! Processor configuration.
//!
//! Defaults: 10 workers, 100 ms artificial per-item delay, 5 s shutdown grace.
//! Sources: JSON (`from_json_str`) or `ITEMPROC_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_WORKERS: &str = "ITEMPROC_WORKERS";
pub const ENV_TASK_DELAY_MS: &str = "ITEMPROC_TASK_DELAY_MS";
pub const ENV_SHUTDOWN_GRACE_MS: &str = "ITEMPROC_SHUTDOWN_GRACE_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("worker pool needs at least one worker")]
    ZeroWorkers,
}

/// Worker pool sizing and shutdown behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Fixed number of worker tasks.
    pub workers: usize,

    /// How long `shutdown()` lets queued and in-flight work drain before
    /// forcing termination.
    pub shutdown_grace_ms: u64,
}

impl PoolConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            shutdown_grace_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub pool: PoolConfig,

    /// Artificial delay before each item is fetched. 0 disables it.
    pub task_delay_ms: u64,
}

impl ProcessorConfig {
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_task_delay(mut self, delay: Duration) -> Self {
        self.task_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn task_delay(&self) -> Duration {
        Duration::from_millis(self.task_delay_ms)
    }

    /// Parse and validate. Missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `ITEMPROC_*` variables from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_WORKERS) {
            config.pool.workers = parse_var(ENV_WORKERS, v)?;
        }
        if let Some(v) = lookup(ENV_TASK_DELAY_MS) {
            config.task_delay_ms = parse_var(ENV_TASK_DELAY_MS, v)?;
        }
        if let Some(v) = lookup(ENV_SHUTDOWN_GRACE_MS) {
            config.pool.shutdown_grace_ms = parse_var(ENV_SHUTDOWN_GRACE_MS, v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            task_delay_ms: 100,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
