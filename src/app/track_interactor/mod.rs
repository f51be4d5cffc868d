// Track interactor - Person tracking over a whole video with annotated output

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{REDETECT_INTERVAL_RANGE, SKIP_FRAMES_RANGE};
use crate::domain::errors::DomainError;
use crate::domain::rules::tracked_output_path;
use crate::engine::{MultiPersonTracker, ProcessingStats, ProgressTracker, TrackingParams, VideoProcessor};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{DetectorLoader, FrameAnnotator, FsPort, SinkFactory, SourceFactory, TrackerFactory};

/// What to track and where to write it
#[derive(Debug, Clone)]
pub struct TrackOptions {
    pub input: PathBuf,
    /// Defaults to `<stem>_tracked<ext>` next to the input
    pub output: Option<PathBuf>,
    pub params: TrackingParams,
    pub skip_frames: u32,
}

impl TrackOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            params: TrackingParams::default(),
            skip_frames: 0,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !REDETECT_INTERVAL_RANGE.contains(&self.params.redetect_interval) {
            return Err(DomainError::BadArgs(format!(
                "Redetect interval must be between {} and {}, got {}",
                REDETECT_INTERVAL_RANGE.start(),
                REDETECT_INTERVAL_RANGE.end(),
                self.params.redetect_interval
            )));
        }
        if !SKIP_FRAMES_RANGE.contains(&self.skip_frames) {
            return Err(DomainError::BadArgs(format!(
                "Skip frames must be between {} and {}, got {}",
                SKIP_FRAMES_RANGE.start(),
                SKIP_FRAMES_RANGE.end(),
                self.skip_frames
            )));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| tracked_output_path(&self.input))
    }
}

/// Outcome of a tracking run
#[derive(Debug, Clone, Serialize)]
pub struct TrackReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: ProcessingStats,
}

/// Interactor for the tracking use case
pub struct TrackInteractor {
    fs_port: Arc<dyn FsPort>,
    sources: Arc<dyn SourceFactory>,
    sinks: Arc<dyn SinkFactory>,
    detectors: Arc<dyn DetectorLoader>,
    trackers: Arc<dyn TrackerFactory>,
    annotator: Arc<dyn FrameAnnotator>,
}

impl TrackInteractor {
    pub fn new(
        fs_port: Arc<dyn FsPort>,
        sources: Arc<dyn SourceFactory>,
        sinks: Arc<dyn SinkFactory>,
        detectors: Arc<dyn DetectorLoader>,
        trackers: Arc<dyn TrackerFactory>,
        annotator: Arc<dyn FrameAnnotator>,
    ) -> Self {
        Self {
            fs_port,
            sources,
            sinks,
            detectors,
            trackers,
            annotator,
        }
    }

    pub async fn execute(
        &self,
        options: TrackOptions,
        progress: ProgressTracker,
    ) -> TrimTrackResult<TrackReport> {
        options.validate()?;
        if !options.input.is_file() {
            return Err(TrimTrackError::InputFileNotFound {
                path: options.input.display().to_string(),
            });
        }
        let output = options.output_path();
        if output == options.input {
            return Err(DomainError::BadArgs("Output would overwrite the input video".to_string()).into());
        }
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs_port.ensure_dir(parent).await?;
        }

        let sources = Arc::clone(&self.sources);
        let sinks = Arc::clone(&self.sinks);
        let detectors = Arc::clone(&self.detectors);
        let trackers = Arc::clone(&self.trackers);
        let annotator = Arc::clone(&self.annotator);
        let TrackOptions {
            input,
            params,
            skip_frames,
            ..
        } = options;

        tokio::task::spawn_blocking(move || -> TrimTrackResult<TrackReport> {
            // The model loads before the video opens so a missing model fails fast
            let detector = detectors.load()?;
            let mut source = sources.open(&input)?;
            let tracker = MultiPersonTracker::new(detector, trackers, params);
            let mut processor = VideoProcessor::new(tracker, annotator, sinks);
            let stats = processor.process_video(source.as_mut(), Some(&output), skip_frames, &progress, None)?;
            info!(output = %output.display(), persons = stats.total_persons, "Tracked video written");
            Ok(TrackReport { input, output, stats })
        })
        .await
        .map_err(|e| TrimTrackError::OutputError {
            message: format!("Tracking task failed: {}", e),
        })?
    }
}
