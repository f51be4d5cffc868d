//! Video and image I/O
//!
//! Decoding and encoding go through libav (`ffmpeg-next`); frames are handed
//! around as packed BGR24 [`VideoFrame`](crate::domain::model::VideoFrame)s.

pub mod decoder;
pub mod encoder;
pub mod still;

pub use decoder::{probe, FfmpegSourceFactory, FrameReader};
pub use encoder::{FfmpegSinkFactory, FrameWriter};
