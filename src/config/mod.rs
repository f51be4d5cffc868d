//! Typed application configuration
//!
//! Values are layered, highest precedence first: command-line flags,
//! `TRIMTRACK_*` environment variables, the TOML file, built-in defaults.
//! The file loader lives in [`crate::adapters::toml_config`]; this module
//! owns the shape, the defaults, the environment overlay and validation.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::model::{AspectRatio, TrackerKind};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::utils::logging::{LogFormat, LogLevel};
use crate::utils::path::{DEFAULT_MODEL_PATH, GENERATED_DIR_NAME};

/// Allowed re-detection intervals, in processed frames
pub const REDETECT_INTERVAL_RANGE: RangeInclusive<u32> = 10..=120;

/// Allowed frame-skip values for tracking
pub const SKIP_FRAMES_RANGE: RangeInclusive<u32> = 0..=5;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TRIMTRACK_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Unset means `RUST_LOG`, else `info`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
    /// ONNX Runtime intra-op threads; 0 picks from the CPU count
    pub threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            conf_threshold: 0.5,
            iou_threshold: 0.45,
            input_size: 640,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub kind: TrackerKind,
    pub redetect_interval: u32,
    pub skip_frames: u32,
    pub match_iou_threshold: f32,
    pub max_lost_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            kind: TrackerKind::Csrt,
            redetect_interval: 30,
            skip_frames: 0,
            match_iou_threshold: 0.3,
            max_lost_frames: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    pub aspect: AspectRatio,
    /// Overrides the `generated` folder next to the source
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Folder listed when `list` gets no `--folder`
    pub folder: Option<PathBuf>,
    pub generated_dir_name: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folder: None,
            generated_dir_name: GENERATED_DIR_NAME.to_string(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    pub cut: CutConfig,
    pub library: LibraryConfig,
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> TrimTrackResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| TrimTrackError::ConfigError {
        message: format!("{}{}={:?}: {}", ENV_PREFIX, key, value, e),
    })
}

fn parse_bool(key: &str, value: &str) -> TrimTrackResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TrimTrackError::ConfigError {
            message: format!("{}{}={:?} is not a boolean", ENV_PREFIX, key, value),
        }),
    }
}

fn parse_level(value: &str) -> TrimTrackResult<LogLevel> {
    <LogLevel as clap::ValueEnum>::from_str(value.trim(), true).map_err(|_| TrimTrackError::ConfigError {
        message: format!("{}LOG_LEVEL={:?} is not a log level", ENV_PREFIX, value),
    })
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> TrimTrackResult<Self> {
        toml::from_str(content).map_err(|e| TrimTrackError::ConfigError {
            message: format!("Failed to parse config: {}", e),
        })
    }

    pub fn to_toml_string(&self) -> TrimTrackResult<String> {
        toml::to_string_pretty(self).map_err(|e| TrimTrackError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    /// Overlay `TRIMTRACK_*` variables from the process environment
    pub fn apply_env(&mut self) -> TrimTrackResult<()> {
        self.apply_env_from(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Overlay variables from a lookup keyed by the name without prefix
    pub fn apply_env_from<F>(&mut self, lookup: F) -> TrimTrackResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LOG_LEVEL") {
            self.general.log_level = Some(parse_level(&value)?);
        }
        if let Some(value) = lookup("JSON_LOGS") {
            if parse_bool("JSON_LOGS", &value)? {
                self.general.log_format = LogFormat::Json;
            }
        }
        if let Some(value) = lookup("MODEL") {
            self.detector.model_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("CONF") {
            self.detector.conf_threshold = parse_env("CONF", &value)?;
        }
        if let Some(value) = lookup("THREADS") {
            self.detector.threads = parse_env("THREADS", &value)?;
        }
        if let Some(value) = lookup("TRACKER") {
            self.tracker.kind = parse_env("TRACKER", &value)?;
        }
        if let Some(value) = lookup("REDETECT_INTERVAL") {
            self.tracker.redetect_interval = parse_env("REDETECT_INTERVAL", &value)?;
        }
        if let Some(value) = lookup("SKIP_FRAMES") {
            self.tracker.skip_frames = parse_env("SKIP_FRAMES", &value)?;
        }
        if let Some(value) = lookup("ASPECT") {
            self.cut.aspect = parse_env("ASPECT", &value)?;
        }
        if let Some(value) = lookup("OUTPUT_DIR") {
            self.cut.output_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("LIBRARY") {
            self.library.folder = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Reject values outside their documented ranges
    pub fn validate(&self) -> TrimTrackResult<()> {
        let unit = |name: &str, value: f32| -> TrimTrackResult<()> {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(TrimTrackError::ConfigError {
                    message: format!("{} must be in (0, 1], got {}", name, value),
                })
            }
        };
        unit("detector.conf_threshold", self.detector.conf_threshold)?;
        unit("detector.iou_threshold", self.detector.iou_threshold)?;
        unit("tracker.match_iou_threshold", self.tracker.match_iou_threshold)?;

        if self.detector.input_size == 0 || self.detector.input_size % 32 != 0 {
            return Err(TrimTrackError::ConfigError {
                message: format!(
                    "detector.input_size must be a positive multiple of 32, got {}",
                    self.detector.input_size
                ),
            });
        }
        if !REDETECT_INTERVAL_RANGE.contains(&self.tracker.redetect_interval) {
            return Err(TrimTrackError::ConfigError {
                message: format!(
                    "tracker.redetect_interval must be in {}..={}, got {}",
                    REDETECT_INTERVAL_RANGE.start(),
                    REDETECT_INTERVAL_RANGE.end(),
                    self.tracker.redetect_interval
                ),
            });
        }
        if !SKIP_FRAMES_RANGE.contains(&self.tracker.skip_frames) {
            return Err(TrimTrackError::ConfigError {
                message: format!(
                    "tracker.skip_frames must be in {}..={}, got {}",
                    SKIP_FRAMES_RANGE.start(),
                    SKIP_FRAMES_RANGE.end(),
                    self.tracker.skip_frames
                ),
            });
        }
        if self.library.generated_dir_name.trim().is_empty() {
            return Err(TrimTrackError::ConfigError {
                message: "library.generated_dir_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Detector threads with the CPU-count fallback applied
    pub fn detector_threads(&self) -> usize {
        match self.detector.threads {
            0 => num_cpus::get().min(4),
            n => n,
        }
    }
}
