//! Error handling module for TrimTrack

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for TrimTrack operations
#[derive(Error, Debug)]
pub enum TrimTrackError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Time range validation error
    #[error("Invalid time range: start ({start}) must be less than end ({end})")]
    InvalidTimeRange { start: String, end: String },

    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Media probe error
    #[error("Failed to probe media file: {message}")]
    ProbeError { message: String },

    /// Frame decoding error
    #[error("Failed to decode video: {message}")]
    DecodeError { message: String },

    /// Frame encoding error
    #[error("Failed to encode video: {message}")]
    EncodeError { message: String },

    /// Detector model missing or unusable
    #[error("Detector model error: {message}")]
    ModelError { message: String },

    /// Inference run failed
    #[error("Inference failed: {message}")]
    InferenceError { message: String },

    /// Tracker creation or update failed
    #[error("Tracker error: {message}")]
    TrackerError { message: String },

    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Model download failed on every mirror
    #[error("Download failed: {message}")]
    DownloadError { message: String },

    /// Output file write error
    #[error("Failed to write output file: {message}")]
    OutputError { message: String },

    /// Domain validation error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),

    /// ONNX Runtime error
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    /// OpenCV error
    #[error("OpenCV error: {0}")]
    OpenCvError(#[from] opencv::Error),

    /// Image codec error
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Result type alias for TrimTrack operations
pub type TrimTrackResult<T> = std::result::Result<T, TrimTrackError>;

impl TrimTrackError {
    /// Bad input on the command line or in the config, as opposed to a media or runtime failure
    pub fn is_user_error(&self) -> bool {
        match self {
            TrimTrackError::InputFileNotFound { .. }
            | TrimTrackError::InvalidTimeFormat { .. }
            | TrimTrackError::InvalidTimeRange { .. }
            | TrimTrackError::ConfigError { .. } => true,
            TrimTrackError::Domain(e) => e.is_user_error(),
            _ => false,
        }
    }
}
