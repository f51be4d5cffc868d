//! In-memory ports shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use trimtrack_cli::domain::model::{BBox, Detection, TrackerKind, VideoFrame, VideoInfo};
use trimtrack_cli::ports::{
    FrameSink, FrameSource, ObjectTracker, PersonDetector, SinkFactory, SourceFactory, TrackerFactory,
};
use trimtrack_cli::TrimTrackResult;

/// Frames whose pixels encode their index; optionally fails reading at one index
pub struct MemorySource {
    info: VideoInfo,
    next: u64,
    fail_at: Option<u64>,
}

impl MemorySource {
    pub fn new(width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        Self {
            info: VideoInfo::new("/memory/source.mp4", width, height, fps, total_frames),
            next: 0,
            fail_at: None,
        }
    }

    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

pub fn index_color(index: u64) -> [u8; 3] {
    [(index % 256) as u8, 100, 200]
}

impl FrameSource for MemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read(&mut self) -> TrimTrackResult<Option<VideoFrame>> {
        if self.fail_at == Some(self.next) {
            return Err(trimtrack_cli::TrimTrackError::DecodeError {
                message: format!("corrupt frame {}", self.next),
            });
        }
        if self.next >= self.info.total_frames {
            return Ok(None);
        }
        let frame = VideoFrame::filled(self.next, self.info.width, self.info.height, index_color(self.next));
        self.next += 1;
        Ok(Some(frame))
    }

    fn seek(&mut self, index: u64) -> TrimTrackResult<()> {
        self.next = index;
        Ok(())
    }
}

/// Opens a fresh [`MemorySource`] for any path
pub struct MemorySources {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
}

impl SourceFactory for MemorySources {
    fn open(&self, _path: &Path) -> TrimTrackResult<Box<dyn FrameSource>> {
        Ok(Box::new(MemorySource::new(
            self.width,
            self.height,
            self.fps,
            self.total_frames,
        )))
    }
}

/// Everything written through a [`MemorySinks`] sink
#[derive(Debug, Default)]
pub struct Recorded {
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frames: Vec<VideoFrame>,
    pub finished: bool,
}

/// Records frames in memory and touches the output file like a real encoder
#[derive(Clone, Default)]
pub struct MemorySinks {
    pub recorded: Arc<Mutex<Recorded>>,
    /// Fail the write of this many-th frame (0-based)
    pub fail_write_at: Option<usize>,
    /// Fail when the container is finalized
    pub fail_finish: bool,
}

impl MemorySinks {
    pub fn frames(&self) -> Vec<VideoFrame> {
        self.recorded.lock().unwrap().frames.clone()
    }
}

struct MemorySink {
    path: PathBuf,
    recorded: Arc<Mutex<Recorded>>,
    fail_write_at: Option<usize>,
    fail_finish: bool,
}

impl SinkFactory for MemorySinks {
    fn create(&self, path: &Path, width: u32, height: u32, fps: f64) -> TrimTrackResult<Box<dyn FrameSink>> {
        std::fs::write(path, b"")?;
        {
            let mut recorded = self.recorded.lock().unwrap();
            *recorded = Recorded {
                path: Some(path.to_path_buf()),
                width,
                height,
                fps,
                frames: Vec::new(),
                finished: false,
            };
        }
        Ok(Box::new(MemorySink {
            path: path.to_path_buf(),
            recorded: Arc::clone(&self.recorded),
            fail_write_at: self.fail_write_at,
            fail_finish: self.fail_finish,
        }))
    }
}

impl FrameSink for MemorySink {
    fn write(&mut self, frame: &VideoFrame) -> TrimTrackResult<()> {
        let mut recorded = self.recorded.lock().unwrap();
        if self.fail_write_at == Some(recorded.frames.len()) {
            return Err(trimtrack_cli::TrimTrackError::EncodeError {
                message: "disk full".to_string(),
            });
        }
        assert_eq!((frame.width, frame.height), (recorded.width, recorded.height));
        recorded.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> TrimTrackResult<()> {
        if self.fail_finish {
            return Err(trimtrack_cli::TrimTrackError::OutputError {
                message: "trailer write failed".to_string(),
            });
        }
        self.recorded.lock().unwrap().finished = true;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Detector replaying a script: one list of boxes per call, empty once exhausted
pub struct ScriptedDetector {
    script: Vec<Vec<BBox>>,
    pub calls: Arc<Mutex<Vec<u64>>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<BBox>>) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PersonDetector for ScriptedDetector {
    fn detect(&mut self, frame: &VideoFrame) -> TrimTrackResult<Vec<Detection>> {
        let mut calls = self.calls.lock().unwrap();
        let boxes = self.script.get(calls.len()).cloned().unwrap_or_default();
        calls.push(frame.index);
        Ok(boxes.into_iter().map(|b| Detection::new(b, 0.9)).collect())
    }
}

/// Tracker that follows its box by `step` pixels per update, or loses it after `lose_after` updates
pub struct DriftTracker {
    bbox: Option<BBox>,
    step: f32,
    updates: u32,
    lose_after: Option<u32>,
}

impl ObjectTracker for DriftTracker {
    fn init(&mut self, _frame: &VideoFrame, bbox: &BBox) -> TrimTrackResult<()> {
        self.bbox = Some(*bbox);
        self.updates = 0;
        Ok(())
    }

    fn update(&mut self, _frame: &VideoFrame) -> TrimTrackResult<Option<BBox>> {
        self.updates += 1;
        if self.lose_after.map_or(false, |n| self.updates > n) {
            return Ok(None);
        }
        let step = self.step;
        Ok(self.bbox.as_mut().map(|b| {
            *b = BBox::new(b.x1 + step, b.y1, b.x2 + step, b.y2);
            *b
        }))
    }
}

/// Creates [`DriftTracker`]s and remembers the kinds asked for
#[derive(Default)]
pub struct DriftTrackers {
    pub step: f32,
    pub lose_after: Option<u32>,
    pub created: Mutex<Vec<TrackerKind>>,
}

impl TrackerFactory for DriftTrackers {
    fn create(&self, kind: TrackerKind) -> TrimTrackResult<Box<dyn ObjectTracker>> {
        self.created.lock().unwrap().push(kind);
        Ok(Box::new(DriftTracker {
            bbox: None,
            step: self.step,
            updates: 0,
            lose_after: self.lose_after,
        }))
    }
}
