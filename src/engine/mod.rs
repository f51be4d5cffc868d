//! Frame-level engines: clip export and person tracking
//!
//! Engines only talk to the frame ports, so they run the same over libav and
//! over in-memory sources in tests.

pub mod cutter;
pub mod processor;
pub mod progress;
pub mod tracking;

pub use cutter::{ClipCutter, CutOutcome, CutReport, CutRequest};
pub use processor::{ProcessingStats, VideoProcessor};
pub use progress::{CancelFlag, ProgressCallback, ProgressPhase, ProgressTracker};
pub use tracking::{MultiPersonTracker, TrackState, TrackingParams};
