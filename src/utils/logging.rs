//! Logging setup on top of `tracing-subscriber`

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{TrimTrackError, TrimTrackResult};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// General information
    #[default]
    Info,
    /// Debug information
    Debug,
    /// Very verbose debug information
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Pretty,
    /// Compact text format
    Compact,
    /// JSON format for structured logging
    Json,
}

/// Logging configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Explicit level from flags, environment or file; `None` defers to `RUST_LOG`
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Include target module information
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: LogFormat::Pretty,
            target: false,
        }
    }
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl LoggingSystem {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// An explicit level wins; `RUST_LOG` only applies when none was given
    pub fn filter(&self) -> EnvFilter {
        match self.config.level {
            Some(level) => EnvFilter::new(level.as_filter()),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().as_filter())),
        }
    }

    /// Install the global subscriber; logs go to stderr so stdout stays parseable
    pub fn initialize(&self) -> TrimTrackResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_target(self.config.target)
            .with_writer(std::io::stderr);

        let result = match self.config.format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.map_err(|e| TrimTrackError::ConfigError {
            message: format!("Failed to initialize logging: {}", e),
        })?;

        tracing::debug!(level = ?self.config.level, format = ?self.config.format, "Logging initialized");
        Ok(())
    }

    /// Log version and build information
    pub fn log_system_info(&self) {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            cpus = num_cpus::get(),
            "TrimTrack starting"
        );
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filters() {
        assert_eq!(LogLevel::Error.as_filter(), "error");
        assert_eq!(LogLevel::default().as_filter(), "info");
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }

    #[test]
    fn test_config_deserializes_lowercase() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"\nformat = \"json\"").unwrap();
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.target);
    }

    #[test]
    fn test_explicit_level_sets_filter() {
        let system = LoggingSystem::new(LoggingConfig {
            level: Some(LogLevel::Warn),
            ..LoggingConfig::default()
        });
        assert_eq!(system.filter().to_string(), "warn");
    }
}
