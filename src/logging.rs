//! Logging setup for the harness.
//!
//! Structured logging via the `tracing` crate. The harness itself only emits
//! `tracing` events; installing a subscriber is left to the embedding test
//! suite, with helpers here for the common cases.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable consulted for a filter directive override.
pub const LOG_ENV_VAR: &str = "GENHARNESS_LOG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            color: default_true(),
        }
    }
}

/// Initialize the global subscriber from a config.
///
/// `GENHARNESS_LOG` overrides the configured level when set. Fails if a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match std::env::var(LOG_ENV_VAR) {
        Ok(directive) => EnvFilter::try_new(directive)?,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let base_subscriber = Registry::default().with(filter);

    if config.format == "json" {
        base_subscriber
            .with(fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        base_subscriber
            .with(fmt::layer().with_target(true).with_ansi(config.color))
            .try_init()?;
    }

    Ok(())
}

/// Best-effort subscriber for tests: captured writer, `GENHARNESS_LOG`
/// filter, and silently a no-op when a subscriber is already installed.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_env(LOG_ENV_VAR))
        .with_test_writer()
        .try_init();
}
