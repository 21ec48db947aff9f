//! Configuration for the operator

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PF_STATUS_RELAY";

/// Main operator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Relay workload image; when unset the image is read from the
    /// environment at sync time
    #[serde(default)]
    pub image: Option<String>,

    /// Admission configuration
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Controller configuration
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Admission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Deadline for listing existing monitors, in seconds
    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            list_timeout_secs: default_list_timeout(),
        }
    }
}

impl AdmissionConfig {
    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }
}

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Deadline for each store call made during a pass, in seconds
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,

    /// Worker count; passes for one monitor never overlap
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_reconciles: usize,

    /// First retry delay after a failed pass, in milliseconds
    #[serde(default = "default_requeue_base_delay")]
    pub requeue_base_delay_ms: u64,

    /// Retry delay cap, in milliseconds
    #[serde(default = "default_requeue_max_delay")]
    pub requeue_max_delay_ms: u64,

    /// Interval between full resyncs of every monitor, in seconds
    #[serde(default = "default_resync_interval")]
    pub resync_interval_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: default_store_timeout(),
            max_concurrent_reconciles: default_max_concurrent(),
            requeue_base_delay_ms: default_requeue_base_delay(),
            requeue_max_delay_ms: default_requeue_max_delay(),
            resync_interval_secs: default_resync_interval(),
        }
    }
}

impl ControllerConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn requeue_base_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_base_delay_ms)
    }

    pub fn requeue_max_delay(&self) -> Duration {
        Duration::from_millis(self.requeue_max_delay_ms)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_list_timeout() -> u64 {
    60
}

fn default_store_timeout() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

fn default_requeue_base_delay() -> u64 {
    100
}

fn default_requeue_max_delay() -> u64 {
    30_000
}

fn default_resync_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

impl OperatorConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Environment keys use the `PF_STATUS_RELAY_` prefix with `__` between
    /// nesting levels, e.g. `PF_STATUS_RELAY_IMAGE` or
    /// `PF_STATUS_RELAY_CONTROLLER__MAX_CONCURRENT_RECONCILES`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&OperatorConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
