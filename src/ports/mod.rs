// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::error::TrimTrackResult;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Open a video and report its size, rate and length
    async fn probe(&self, path: &Path) -> Result<VideoInfo, DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Video files directly inside a folder, sorted by lowercase name
    async fn list_videos(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError>;

    /// Video files directly inside a folder, newest first
    async fn list_recent(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError>;

    /// Create a directory and its parents
    async fn ensure_dir(&self, path: &Path) -> Result<(), DomainError>;

    /// Delete a file if it exists
    async fn remove_file(&self, path: &Path) -> Result<(), DomainError>;

    /// Show a file in the platform file manager
    fn reveal(&self, path: &Path) -> Result<(), DomainError>;
}

/// Sequential frame source with random access by index
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;

    /// Next frame, `None` at end of stream
    fn read(&mut self) -> TrimTrackResult<Option<VideoFrame>>;

    /// Position so the next `read` returns `index`
    fn seek(&mut self, index: u64) -> TrimTrackResult<()>;
}

/// Frame sink producing a video file
pub trait FrameSink {
    fn write(&mut self, frame: &VideoFrame) -> TrimTrackResult<()>;

    /// Flush pending frames and close the file
    fn finish(&mut self) -> TrimTrackResult<()>;

    fn path(&self) -> &Path;
}

/// Opens frame sources by path
pub trait SourceFactory: Send + Sync {
    fn open(&self, path: &Path) -> TrimTrackResult<Box<dyn FrameSource>>;
}

/// Opens frame sinks; lets the engines stay independent of the encoder
pub trait SinkFactory: Send + Sync {
    fn create(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> TrimTrackResult<Box<dyn FrameSink>>;
}

/// Person detector over full frames
pub trait PersonDetector {
    /// Person boxes above the confidence threshold, highest confidence first
    fn detect(&mut self, frame: &VideoFrame) -> TrimTrackResult<Vec<Detection>>;

    fn detect_largest_person(&mut self, frame: &VideoFrame) -> TrimTrackResult<Option<Detection>> {
        let detections = self.detect(frame)?;
        Ok(crate::domain::rules::largest_detection(&detections))
    }
}

/// Loads a detector on the thread that will run it
pub trait DetectorLoader: Send + Sync {
    fn load(&self) -> TrimTrackResult<Box<dyn PersonDetector>>;
}

/// Single-target visual tracker
pub trait ObjectTracker {
    /// Start tracking the box in this frame
    fn init(&mut self, frame: &VideoFrame, bbox: &BBox) -> TrimTrackResult<()>;

    /// New position in this frame, `None` when the target is lost
    fn update(&mut self, frame: &VideoFrame) -> TrimTrackResult<Option<BBox>>;
}

/// Creates trackers of a given kind
pub trait TrackerFactory: Send + Sync {
    fn create(&self, kind: TrackerKind) -> TrimTrackResult<Box<dyn ObjectTracker>>;
}

/// Header line drawn on every annotated frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStats {
    pub active_tracks: usize,
    pub total_ids: u32,
    pub fps: f64,
}

/// Draws tracking results onto frames
pub trait FrameAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &mut VideoFrame,
        results: &[TrackResult],
        stats: &OverlayStats,
    ) -> TrimTrackResult<()>;

    /// Plain detection boxes, labelled `person <conf>`
    fn annotate_detections(
        &self,
        frame: &mut VideoFrame,
        detections: &[Detection],
    ) -> TrimTrackResult<()>;
}

/// Port for fetching the detector model
pub trait ModelFetchPort: Send + Sync {
    /// Download into `dest`, trying each source in order; returns the URL that worked
    fn fetch(&self, dest: &Path) -> TrimTrackResult<String>;
}

