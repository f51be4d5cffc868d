// Timeline - frame range selection and playback pacing

use std::time::Duration;

use crate::domain::errors::DomainError;
use crate::domain::model::{effective_fps, frame_to_time};

/// Quick duration presets in seconds
pub const DURATION_PRESETS: [u32; 12] = [5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60];

/// Selectable playback speeds
pub const PLAYBACK_SPEEDS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

/// Start, end and preview positions over a frame range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    min: u64,
    max: u64,
    start: u64,
    end: u64,
    preview: u64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(0, 100)
    }
}

impl Timeline {
    pub fn new(min: u64, max: u64) -> Self {
        let mut timeline = Self {
            min: 0,
            max: 0,
            start: 0,
            end: 0,
            preview: 0,
        };
        timeline.set_range(min, max);
        timeline
    }

    /// Timeline covering every frame of a video
    pub fn for_frames(total_frames: u64) -> Self {
        Self::new(0, total_frames.saturating_sub(1))
    }

    /// Replace the bounds and select everything
    pub fn set_range(&mut self, min: u64, max: u64) {
        let max = max.max(min);
        self.min = min;
        self.max = max;
        self.start = min;
        self.end = max;
        self.preview = min;
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn preview(&self) -> u64 {
        self.preview
    }

    /// Clamped to [min, end - 1]
    pub fn set_start(&mut self, value: u64) {
        self.start = value.min(self.end.saturating_sub(1)).max(self.min);
    }

    /// Clamped to [start + 1, max]
    pub fn set_end(&mut self, value: u64) {
        self.end = value.max(self.start + 1).min(self.max);
    }

    /// Clamped to [min, max]
    pub fn set_preview(&mut self, value: u64) {
        self.preview = value.clamp(self.min, self.max);
    }

    /// Move the start to the preview; pushes the end along if the preview is past it
    pub fn set_preview_as_start(&mut self) {
        if self.preview > self.end {
            self.set_end(self.preview);
        }
        self.set_start(self.preview);
    }

    /// Move the end to the preview; pulls the start along if the preview is before it
    pub fn set_preview_as_end(&mut self) {
        if self.preview < self.start {
            self.set_start(self.preview);
        }
        self.set_end(self.preview);
    }

    /// End = start + seconds of frames, capped at the last frame
    pub fn set_duration(&mut self, seconds: f64, fps: f64, total_frames: u64) -> Result<(), DomainError> {
        if seconds.is_nan() || seconds <= 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Duration must be positive, got {}",
                seconds
            )));
        }
        let frames = (seconds * effective_fps(fps)) as u64;
        let end = (self.start + frames).min(total_frames.saturating_sub(1));
        self.set_end(end);
        Ok(())
    }

    /// Number of frames in the selection
    pub fn selected_frames(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// `start - end (duration, N frames)`
    pub fn selection_label(&self, fps: f64) -> String {
        format!(
            "{} - {} ({}, {} frames)",
            frame_to_time(self.start, fps),
            frame_to_time(self.end, fps),
            frame_to_time(self.selected_frames(), fps),
            self.selected_frames()
        )
    }
}

/// What playback covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// From the preview to the last frame
    Full,
    /// From the range start to the range end
    Range,
}

/// Frames consumed by one playback tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub from: u64,
    pub to: u64,
    /// Frames to read; the last one is displayed
    pub frames: u64,
}

/// Playback pacing: timer interval, frame skipping and stop conditions
#[derive(Debug, Clone)]
pub struct Playback {
    fps: f64,
    speed: f64,
    frame_skip: u32,
    interval: Duration,
    mode: PlaybackMode,
    playing: bool,
}

impl Playback {
    pub fn new(fps: f64) -> Self {
        let mut playback = Self {
            fps: effective_fps(fps),
            speed: 1.0,
            frame_skip: 1,
            interval: Duration::ZERO,
            mode: PlaybackMode::Full,
            playing: false,
        };
        playback.update_interval();
        playback
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn frame_skip(&self) -> u32 {
        self.frame_skip
    }

    /// Timer period between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), DomainError> {
        if !PLAYBACK_SPEEDS.contains(&speed) {
            return Err(DomainError::BadArgs(format!(
                "Unsupported playback speed {}. Expected one of 0.5, 1, 2, 4",
                speed
            )));
        }
        self.speed = speed;
        self.update_interval();
        Ok(())
    }

    /// Recompute the skip and timer period from the speed
    fn update_interval(&mut self) {
        self.frame_skip = if self.speed >= 2.0 { self.speed as u32 } else { 1 };
        let effective = self.fps * self.speed / self.frame_skip as f64;
        let millis = (1000.0 / effective) as u64;
        self.interval = Duration::from_millis(millis.max(10));
    }

    /// Begin playing; range mode jumps the preview to the range start
    pub fn start(&mut self, mode: PlaybackMode, timeline: &mut Timeline) {
        self.mode = mode;
        if mode == PlaybackMode::Range {
            timeline.set_preview(timeline.start());
        }
        self.update_interval();
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    fn limit(&self, timeline: &Timeline, total_frames: u64) -> u64 {
        match self.mode {
            PlaybackMode::Range => timeline.end(),
            PlaybackMode::Full => total_frames.saturating_sub(1),
        }
    }

    /// One timer tick. `observed` is the real time since the previous tick; at 4x, falling
    /// more than 20% behind raises the skip. Returns `None` once playback has stopped.
    pub fn tick(
        &mut self,
        timeline: &mut Timeline,
        total_frames: u64,
        observed: Option<Duration>,
    ) -> Option<Advance> {
        if !self.playing {
            return None;
        }

        if self.speed >= 4.0 {
            if let Some(observed) = observed {
                let expected = self.frame_skip as f64 / (self.fps * self.speed);
                if observed.as_secs_f64() > expected * 1.2 {
                    let raised = (self.frame_skip as f64 * 1.5) as u32;
                    self.frame_skip = raised.min((self.speed * 2.0) as u32);
                }
            }
        }

        let current = timeline.preview();
        let limit = self.limit(timeline, total_frames);
        if current >= limit {
            self.stop();
            return None;
        }

        let frames = u64::from(self.frame_skip).min(limit - current);
        let to = current + frames;
        timeline.set_preview(to);
        Some(Advance {
            from: current,
            to,
            frames,
        })
    }
}

#[cfg(test)]
mod tests;
