//! Clip export: copy a frame range, cropped, into a new video

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::model::{frame_to_time, CropRegion, PixelRect};
use crate::engine::progress::{ProgressPhase, ProgressTracker};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{FrameSource, SinkFactory};

/// Frame range and crop to export; `end_frame` is exclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutRequest {
    pub start_frame: u64,
    pub end_frame: u64,
    pub crop: CropRegion,
    pub output: PathBuf,
}

impl CutRequest {
    pub fn frame_count(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

/// Result of a finished export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutReport {
    pub output: PathBuf,
    pub frames_requested: u64,
    pub frames_written: u64,
    pub fps: f64,
    /// `HH:MM:SS` of the requested range
    pub duration: String,
    pub crop: PixelRect,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CutOutcome {
    Completed(CutReport),
    /// Stopped on request; the partial file has been deleted
    Cancelled { frames_written: u64 },
}

/// Exports frame ranges through any [`FrameSource`] / [`SinkFactory`] pair
pub struct ClipCutter<'a> {
    sinks: &'a dyn SinkFactory,
}

impl<'a> ClipCutter<'a> {
    pub fn new(sinks: &'a dyn SinkFactory) -> Self {
        Self { sinks }
    }

    pub fn cut(
        &self,
        source: &mut dyn FrameSource,
        request: &CutRequest,
        progress: &ProgressTracker,
    ) -> TrimTrackResult<CutOutcome> {
        let info = source.info().clone();
        if request.end_frame <= request.start_frame {
            return Err(TrimTrackError::InvalidTimeRange {
                start: frame_to_time(request.start_frame, info.fps),
                end: frame_to_time(request.end_frame, info.fps),
            });
        }
        request.crop.validate()?;

        let total = request.frame_count();
        let rect = request.crop.to_pixels(info.width, info.height)?;
        info!(
            input = %info.path.display(),
            output = %request.output.display(),
            start = request.start_frame,
            frames = total,
            crop = %rect,
            "Exporting clip"
        );

        progress.start("Exporting clip", Some(total));
        progress.set_phase(ProgressPhase::Seeking, None);
        source.seek(request.start_frame)?;

        let mut sink = self
            .sinks
            .create(&request.output, rect.width, rect.height, info.fps)?;

        progress.set_phase(ProgressPhase::Processing, None);
        let mut written = 0u64;
        let mut cancelled = false;
        let mut failure = None;
        for i in 0..total {
            if progress.is_cancelled() {
                cancelled = true;
                break;
            }
            let frame = match source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    warn!(frame = request.start_frame + i, "Source ended before the range end");
                    break;
                }
                Err(e) => {
                    warn!(frame = request.start_frame + i, error = %e, "Read failed, stopping export");
                    break;
                }
            };
            let result = frame
                .crop(&rect)
                .map_err(TrimTrackError::from)
                .and_then(|cropped| sink.write(&cropped));
            if let Err(e) = result {
                failure = Some(e);
                break;
            }
            written += 1;
            progress.update(i + 1, Some(format!("{}/{} frames", i + 1, total)));
        }

        progress.set_phase(ProgressPhase::Finalizing, None);
        let finished = sink.finish();

        if cancelled || failure.is_some() || finished.is_err() || written == 0 {
            Self::discard(&request.output);
        }
        if cancelled {
            info!(frames = written, "Export cancelled");
            progress.mark_cancelled();
            return Ok(CutOutcome::Cancelled {
                frames_written: written,
            });
        }
        if let Some(e) = failure {
            progress.error(&e.to_string());
            return Err(e);
        }
        if let Err(e) = finished {
            progress.error(&e.to_string());
            return Err(e);
        }
        if written == 0 {
            let e = TrimTrackError::DecodeError {
                message: format!("No frames could be read from frame {}", request.start_frame),
            };
            progress.error(&e.to_string());
            return Err(e);
        }

        let report = CutReport {
            output: request.output.clone(),
            frames_requested: total,
            frames_written: written,
            fps: info.fps,
            duration: frame_to_time(total, info.fps),
            crop: rect,
        };
        progress.complete(Some(format!(
            "{} ({}, {}x{})",
            report.output.display(),
            report.duration,
            rect.width,
            rect.height
        )));
        Ok(CutOutcome::Completed(report))
    }

    fn discard(path: &std::path::Path) {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
        }
    }
}
