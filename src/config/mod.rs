//! Configuration for the analysis scheduler.
//!
//! Loading priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file
//! 3. Environment variables (highest priority, prefix `DIAG`)


use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_CYCLE_INTERVAL_MS;
use crate::constants::DEFAULT_DEBOUNCE_WINDOW_MS;
use crate::constants::DEFAULT_MAX_BATCH_SIZE;
use crate::constants::DEFAULT_QUERY_TIMEOUT_MS;
use crate::Error;
use crate::Result;

/// Tuning parameters of the background analysis scheduler
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    /// Minimum quiet time after the last edit to a unit before it becomes
    /// analysis-eligible (milliseconds)
    /// Default value is set via default_debounce_window_ms() function
    #[serde(default = "default_debounce_window_ms")]
    pub debounce_window_ms: u64,

    /// Delay between scheduler drain cycles (milliseconds)
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Upper bound on concurrent analyses launched per cycle
    /// Explicit backpressure policy, not an incidental limitation
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Bound applied to diagnostic queries when the caller supplies none
    /// (milliseconds)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: default_debounce_window_ms(),
            cycle_interval_ms: default_cycle_interval_ms(),
            max_batch_size: default_max_batch_size(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from multiple sources with priority:
    /// 1. Optional config file
    /// 2. Environment variables (prefix `DIAG`, separator `__`)
    ///
    /// # Arguments
    /// * `path` - Optional path to a scheduler configuration file
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(p) = path {
            builder = builder.add_source(File::with_name(p).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("DIAG")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: SchedulerConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates scheduler tuning parameters
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "max_batch_size must be greater than 0".into(),
            )));
        }

        if self.cycle_interval_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "cycle_interval_ms must be at least 1ms".into(),
            )));
        }

        if self.query_timeout_ms < 1 {
            return Err(Error::Config(ConfigError::Message(
                "query_timeout_ms must be at least 1ms".into(),
            )));
        }

        Ok(())
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

fn default_debounce_window_ms() -> u64 {
    DEFAULT_DEBOUNCE_WINDOW_MS
}
fn default_cycle_interval_ms() -> u64 {
    DEFAULT_CYCLE_INTERVAL_MS
}
fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}
fn default_query_timeout_ms() -> u64 {
    DEFAULT_QUERY_TIMEOUT_MS
}
