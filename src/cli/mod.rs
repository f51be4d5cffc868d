//! CLI module for TrimTrack
//!
//! Argument parsing and the glue from parsed commands to the interactors.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::utils::logging::{LogFormat, LogLevel, LoggingConfig};

pub mod args;
pub mod commands;

/// TrimTrack video clip editor
///
/// Trims clips by time range, crops them, and detects and tracks people
/// with a YOLOv8 model and OpenCV correlation trackers.
#[derive(Parser, Debug)]
#[command(name = "trimtrack")]
#[command(about = "Trim, crop and track people in video clips")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file (default: <config dir>/trimtrack/config.toml)
    #[arg(long, global = true, env = "TRIMTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show size, frame rate and length of a video
    Inspect(args::InspectArgs),
    /// List source videos or generated clips in a folder
    List(args::ListArgs),
    /// Export a time range, optionally cropped, to a new clip
    Cut(args::CutArgs),
    /// Render editor frames (a single position or a playback run) to PNG
    Preview(args::PreviewArgs),
    /// Detect and track people through a video
    Track(args::TrackArgs),
    /// Detect people in a single image
    Detect(args::DetectArgs),
    /// Download the YOLOv8n detector model
    FetchModel(args::FetchModelArgs),
    /// Show a file in the platform file manager
    Reveal(args::RevealArgs),
}

impl Cli {
    /// Flags win over environment, file and defaults
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = self.log_level {
            config.general.log_level = Some(level);
        }
        if self.json_logs {
            config.general.log_format = LogFormat::Json;
        }
        self.command.apply_overrides(config);
    }

    pub fn logging_config(config: &AppConfig) -> LoggingConfig {
        LoggingConfig {
            level: config.general.log_level,
            format: config.general.log_format,
            target: false,
        }
    }
}

impl Commands {
    fn apply_overrides(&self, config: &mut AppConfig) {
        match self {
            Commands::Cut(args) => {
                if let Some(aspect) = args.aspect {
                    config.cut.aspect = aspect;
                }
                if let Some(dir) = &args.output_dir {
                    config.cut.output_dir = Some(dir.clone());
                }
            }
            Commands::List(args) => {
                if let Some(folder) = &args.folder {
                    config.library.folder = Some(folder.clone());
                }
            }
            Commands::Track(args) => {
                if let Some(kind) = args.tracker {
                    config.tracker.kind = kind;
                }
                if let Some(interval) = args.redetect_interval {
                    config.tracker.redetect_interval = interval;
                }
                if let Some(skip) = args.skip_frames {
                    config.tracker.skip_frames = skip;
                }
                apply_detector_overrides(config, &args.model, args.conf);
            }
            Commands::Detect(args) => apply_detector_overrides(config, &args.model, args.conf),
            Commands::FetchModel(args) => {
                if let Some(dest) = &args.dest {
                    config.detector.model_path = dest.clone();
                }
            }
            Commands::Inspect(_) | Commands::Preview(_) | Commands::Reveal(_) => {}
        }
    }
}

fn apply_detector_overrides(config: &mut AppConfig, model: &Option<PathBuf>, conf: Option<f32>) {
    if let Some(model) = model {
        config.detector.model_path = model.clone();
    }
    if let Some(conf) = conf {
        config.detector.conf_threshold = conf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AspectRatio, TrackerKind};

    #[test]
    fn test_track_flags_override_config() {
        let cli = Cli::parse_from([
            "trimtrack",
            "--log-level",
            "debug",
            "track",
            "-i",
            "walk.mp4",
            "--tracker",
            "kcf",
            "--redetect-interval",
            "60",
            "--skip-frames",
            "2",
            "--model",
            "/models/custom.onnx",
            "--conf",
            "0.7",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.general.log_level, Some(LogLevel::Debug));
        assert_eq!(config.tracker.kind, TrackerKind::Kcf);
        assert_eq!(config.tracker.redetect_interval, 60);
        assert_eq!(config.tracker.skip_frames, 2);
        assert_eq!(config.detector.model_path, PathBuf::from("/models/custom.onnx"));
        assert_eq!(config.detector.conf_threshold, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let cli = Cli::parse_from(["trimtrack", "cut", "-i", "walk.mp4"]);
        let mut config = AppConfig::default();
        config.cut.aspect = AspectRatio::NineSixteen;
        cli.apply_overrides(&mut config);

        assert_eq!(config.cut.aspect, AspectRatio::NineSixteen);
        assert_eq!(config.general.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_rejects_out_of_range_tracking_flags() {
        assert!(Cli::try_parse_from(["trimtrack", "track", "-i", "a.mp4", "--redetect-interval", "5"]).is_err());
        assert!(Cli::try_parse_from(["trimtrack", "track", "-i", "a.mp4", "--skip-frames", "6"]).is_err());
    }

    #[test]
    fn test_cut_end_and_duration_conflict() {
        assert!(Cli::try_parse_from([
            "trimtrack", "cut", "-i", "a.mp4", "--end", "10", "--duration", "5"
        ])
        .is_err());
    }

    #[test]
    fn test_preview_needs_a_mode() {
        assert!(Cli::try_parse_from(["trimtrack", "preview", "-i", "a.mp4", "--out-dir", "out"]).is_err());
        assert!(Cli::try_parse_from([
            "trimtrack", "preview", "-i", "a.mp4", "--at", "1:30", "--out-dir", "out"
        ])
        .is_ok());
    }
}
