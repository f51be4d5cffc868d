//! Headless clip editor
//!
//! Holds everything the editing widgets drive: the range selection, playback
//! pacing, the crop box and the frame currently on screen. A front end maps
//! slider moves, button presses, mouse drags and timer ticks onto these calls.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::domain::crop::CropEditor;
use crate::domain::errors::DomainError;
use crate::domain::model::{AspectRatio, VideoFrame, VideoInfo};
use crate::domain::timeline::{Playback, PlaybackMode, Timeline};
use crate::engine::CutRequest;
use crate::error::TrimTrackResult;
use crate::ports::FrameSource;

pub struct ClipEditor {
    source: Box<dyn FrameSource>,
    info: VideoInfo,
    timeline: Timeline,
    playback: Playback,
    crop: CropEditor,
    current: Option<VideoFrame>,
    /// Index the next `read` on the source returns
    position: u64,
}

impl ClipEditor {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        let info = source.info().clone();
        let mut crop = CropEditor::new();
        crop.set_video_size(info.width, info.height);
        Self {
            timeline: Timeline::for_frames(info.total_frames),
            playback: Playback::new(info.fps),
            crop,
            current: None,
            position: 0,
            source,
            info,
        }
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn crop_editor(&self) -> &CropEditor {
        &self.crop
    }

    pub fn crop_editor_mut(&mut self) -> &mut CropEditor {
        &mut self.crop
    }

    /// Frame on screen
    pub fn current_frame(&self) -> Option<&VideoFrame> {
        self.current.as_ref()
    }

    /// Move the preview to `frame` and decode it
    pub fn show(&mut self, frame: u64) -> TrimTrackResult<Option<&VideoFrame>> {
        self.timeline.set_preview(frame);
        let index = self.timeline.preview();
        self.source.seek(index)?;
        self.current = self.source.read()?;
        self.position = index + 1;
        Ok(self.current.as_ref())
    }

    /// Range start at the preview
    pub fn mark_start(&mut self) {
        self.timeline.set_preview_as_start();
    }

    /// Range end at the preview
    pub fn mark_end(&mut self) {
        self.timeline.set_preview_as_end();
    }

    pub fn set_duration(&mut self, seconds: f64) -> Result<(), DomainError> {
        self.timeline
            .set_duration(seconds, self.info.fps, self.info.total_frames)
    }

    pub fn set_aspect(&mut self, aspect: AspectRatio) {
        self.crop.set_aspect(aspect);
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), DomainError> {
        self.playback.set_speed(speed)
    }

    /// Start playing and show the first frame of the run
    pub fn play(&mut self, mode: PlaybackMode) -> TrimTrackResult<Option<&VideoFrame>> {
        self.playback.start(mode, &mut self.timeline);
        debug!(
            ?mode,
            speed = self.playback.speed(),
            interval_ms = self.playback.interval().as_millis() as u64,
            "Playback started"
        );
        let preview = self.timeline.preview();
        self.show(preview)
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// One timer tick: decode the skipped frames and keep the last one.
    /// `None` once playback has reached its limit or the stream ended.
    pub fn tick(&mut self, observed: Option<Duration>) -> TrimTrackResult<Option<&VideoFrame>> {
        let Some(advance) = self
            .playback
            .tick(&mut self.timeline, self.info.total_frames, observed)
        else {
            return Ok(None);
        };

        if self.position != advance.from + 1 {
            self.source.seek(advance.from + 1)?;
            self.position = advance.from + 1;
        }

        let mut last = None;
        for _ in 0..advance.frames {
            match self.source.read()? {
                Some(frame) => {
                    self.position = frame.index + 1;
                    last = Some(frame);
                }
                None => break,
            }
        }

        match last {
            Some(frame) => {
                self.current = Some(frame);
                Ok(self.current.as_ref())
            }
            None => {
                debug!(frame = advance.from, "Stream ended during playback");
                self.playback.stop();
                Ok(None)
            }
        }
    }

    /// `start - end (duration, N frames)`
    pub fn selection_label(&self) -> String {
        self.timeline.selection_label(self.info.fps)
    }

    /// Export request for the current range and crop
    pub fn cut_request(&self, output: impl Into<PathBuf>) -> CutRequest {
        CutRequest {
            start_frame: self.timeline.start(),
            end_frame: self.timeline.end(),
            crop: self.crop.crop(),
            output: output.into(),
        }
    }
}
