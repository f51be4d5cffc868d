//! Whole-video tracking with annotated output

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::model::{CropRegion, TrackMethod, VideoFrame};
use crate::domain::rules::{output_fps, should_process_frame};
use crate::engine::progress::{CancelFlag, ProgressPhase, ProgressTracker};
use crate::engine::tracking::MultiPersonTracker;
use crate::error::TrimTrackResult;
use crate::ports::{FrameAnnotator, FrameSink, FrameSource, OverlayStats, SinkFactory};

/// Counters for one processing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Frames that went through the tracker
    pub total_frames: u64,
    /// Frames with at least one detector position
    pub yolo_frames: u64,
    /// Frames positioned by trackers only
    pub tracker_frames: u64,
    /// Ids handed out
    pub total_persons: u32,
    /// Processed frames per wall-clock second
    pub avg_fps: f64,
    /// Whether the run was stopped before the end of the input
    pub stopped: bool,
}

/// Runs a [`MultiPersonTracker`] over a video and writes the annotated frames
pub struct VideoProcessor {
    tracker: MultiPersonTracker,
    annotator: Arc<dyn FrameAnnotator>,
    sinks: Arc<dyn SinkFactory>,
    stop: CancelFlag,
    stats: ProcessingStats,
}

impl VideoProcessor {
    pub fn new(
        tracker: MultiPersonTracker,
        annotator: Arc<dyn FrameAnnotator>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Self {
        Self {
            tracker,
            annotator,
            sinks,
            stop: CancelFlag::new(),
            stats: ProcessingStats::default(),
        }
    }

    /// Handle that asks a running `process_video` to finish after the current frame
    pub fn stop_flag(&self) -> CancelFlag {
        self.stop.clone()
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    pub fn tracker(&self) -> &MultiPersonTracker {
        &self.tracker
    }

    /// Track every kept frame of `source`; `preview` sees each annotated frame
    pub fn process_video(
        &mut self,
        source: &mut dyn FrameSource,
        output: Option<&Path>,
        skip_frames: u32,
        progress: &ProgressTracker,
        mut preview: Option<&mut dyn FnMut(&VideoFrame)>,
    ) -> TrimTrackResult<ProcessingStats> {
        self.stop.reset();
        self.tracker.reset();
        self.stats = ProcessingStats::default();

        let info = source.info().clone();
        // The encoder needs even dimensions
        let even = CropRegion::full().to_pixels(info.width, info.height)?;
        let needs_trim = even.width != info.width || even.height != info.height;

        let mut sink: Option<Box<dyn FrameSink>> = match output {
            Some(path) => Some(self.sinks.create(
                path,
                even.width,
                even.height,
                output_fps(info.fps, skip_frames),
            )?),
            None => None,
        };

        info!(
            input = %info.path.display(),
            output = ?output.map(|p| p.display().to_string()),
            tracker = %self.tracker.params().kind,
            redetect_interval = self.tracker.params().redetect_interval,
            skip_frames,
            "Tracking video"
        );

        progress.start("Tracking persons", Some(info.total_frames).filter(|t| *t > 0));
        progress.set_phase(ProgressPhase::Processing, None);
        let started = Instant::now();
        let mut frame_number = 0u64;

        let run = (|| -> TrimTrackResult<()> {
            loop {
                if self.stop.is_cancelled() || progress.is_cancelled() {
                    self.stats.stopped = true;
                    break;
                }
                let Some(mut frame) = source.read()? else {
                    break;
                };
                frame_number += 1;
                if !should_process_frame(frame_number, skip_frames) {
                    continue;
                }

                self.stats.total_frames += 1;
                let results = self.tracker.process_frame(&frame)?;

                let yolo = results.iter().any(|r| r.method == TrackMethod::Yolo);
                let tracked = results.iter().any(|r| r.method == TrackMethod::Tracker);
                if yolo {
                    self.stats.yolo_frames += 1;
                } else if tracked {
                    self.stats.tracker_frames += 1;
                }
                self.stats.total_persons = self.tracker.total_ids();
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    self.stats.avg_fps = self.stats.total_frames as f64 / elapsed;
                }

                let overlay = OverlayStats {
                    active_tracks: results.len(),
                    total_ids: self.stats.total_persons,
                    fps: self.stats.avg_fps,
                };
                self.annotator.annotate(&mut frame, &results, &overlay)?;
                if needs_trim {
                    frame = frame.crop(&even)?;
                }

                if let Some(sink) = sink.as_mut() {
                    sink.write(&frame)?;
                }
                if let Some(preview) = preview.as_deref_mut() {
                    preview(&frame);
                }
                progress.update(
                    frame_number,
                    Some(format!(
                        "persons {} | {:.1} fps",
                        self.stats.total_persons, self.stats.avg_fps
                    )),
                );
            }
            Ok(())
        })();

        progress.set_phase(ProgressPhase::Finalizing, None);
        // Frames written before a stop or an error are kept
        let finished = match sink.as_mut() {
            Some(sink) => sink.finish(),
            None => Ok(()),
        };
        if let Err(e) = run {
            progress.error(&e.to_string());
            return Err(e);
        }
        finished?;

        if self.stats.stopped {
            warn!(frames = self.stats.total_frames, "Tracking stopped early");
            progress.mark_cancelled();
        } else {
            progress.complete(Some(format!(
                "{} frames, {} persons",
                self.stats.total_frames, self.stats.total_persons
            )));
        }
        info!(
            frames = self.stats.total_frames,
            yolo_frames = self.stats.yolo_frames,
            tracker_frames = self.stats.tracker_frames,
            persons = self.stats.total_persons,
            fps = self.stats.avg_fps,
            "Tracking finished"
        );
        Ok(self.stats.clone())
    }
}
