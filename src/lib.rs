//! TrimTrack library
//!
//! Video clip trimming and cropping plus YOLOv8 person detection and
//! multi-person tracking. Decoding and encoding go through libav, detection
//! through ONNX Runtime and tracking through OpenCV.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod media;
pub mod ports;
pub mod utils;

use std::sync::OnceLock;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{CropRegion, TimeSpec, VideoFrame, VideoInfo};
pub use error::{TrimTrackError, TrimTrackResult};

static FFMPEG_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initialize libav once per process; later calls return the first result
pub fn init() -> TrimTrackResult<()> {
    FFMPEG_INIT
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|e| e.to_string())?;
            ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
            Ok(())
        })
        .clone()
        .map_err(|message| TrimTrackError::FFmpegInitError { message })
}
