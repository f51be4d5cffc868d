//! Single-target OpenCV trackers behind [`ObjectTracker`]

use opencv::core::{Mat, Ptr, Rect, Rect2d};
use opencv::prelude::*;
use opencv::tracking::{
    legacy_TrackerMOSSE, TrackerCSRT, TrackerCSRT_Params, TrackerKCF, TrackerKCF_Params,
};
use tracing::trace;

use super::mat::{bbox_to_rect, bbox_to_rect2d, frame_to_mat, rect2d_to_bbox, rect_to_bbox};
use crate::domain::model::{BBox, TrackerKind, VideoFrame};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{ObjectTracker, TrackerFactory};

enum CvTracker {
    Kcf(Ptr<TrackerKCF>),
    Csrt(Ptr<TrackerCSRT>),
    Mosse(Ptr<legacy_TrackerMOSSE>),
}

impl CvTracker {
    fn create(kind: TrackerKind) -> TrimTrackResult<Self> {
        let tracker = match kind {
            TrackerKind::Kcf => CvTracker::Kcf(TrackerKCF::create(TrackerKCF_Params::default()?)?),
            TrackerKind::Csrt => {
                CvTracker::Csrt(TrackerCSRT::create(&TrackerCSRT_Params::default()?)?)
            }
            TrackerKind::Mosse => CvTracker::Mosse(legacy_TrackerMOSSE::create()?),
        };
        Ok(tracker)
    }

    fn init(&mut self, mat: &Mat, bbox: &BBox) -> TrimTrackResult<bool> {
        match self {
            CvTracker::Kcf(tracker) => {
                tracker.init(mat, bbox_to_rect(bbox))?;
                Ok(true)
            }
            CvTracker::Csrt(tracker) => {
                tracker.init(mat, bbox_to_rect(bbox))?;
                Ok(true)
            }
            CvTracker::Mosse(tracker) => Ok(tracker.init(mat, bbox_to_rect2d(bbox))?),
        }
    }

    fn update(&mut self, mat: &Mat) -> TrimTrackResult<Option<BBox>> {
        match self {
            CvTracker::Kcf(tracker) => {
                let mut rect = Rect::default();
                Ok(tracker.update(mat, &mut rect)?.then(|| rect_to_bbox(&rect)))
            }
            CvTracker::Csrt(tracker) => {
                let mut rect = Rect::default();
                Ok(tracker.update(mat, &mut rect)?.then(|| rect_to_bbox(&rect)))
            }
            CvTracker::Mosse(tracker) => {
                let mut rect = Rect2d::default();
                Ok(tracker.update(mat, &mut rect)?.then(|| rect2d_to_bbox(&rect)))
            }
        }
    }
}

/// OpenCV tracker that is rebuilt from scratch on every `init`
pub struct OpenCvTracker {
    kind: TrackerKind,
    inner: Option<CvTracker>,
}

impl OpenCvTracker {
    pub fn new(kind: TrackerKind) -> Self {
        Self { kind, inner: None }
    }

    pub fn kind(&self) -> TrackerKind {
        self.kind
    }
}

impl ObjectTracker for OpenCvTracker {
    fn init(&mut self, frame: &VideoFrame, bbox: &BBox) -> TrimTrackResult<()> {
        if bbox.width() < 1.0 || bbox.height() < 1.0 {
            self.inner = None;
            return Err(TrimTrackError::TrackerError {
                message: format!("Cannot track an empty box {:?}", bbox),
            });
        }

        let mat = frame_to_mat(frame)?;
        let mut tracker = CvTracker::create(self.kind)?;
        if !tracker.init(&mat, bbox)? {
            self.inner = None;
            return Err(TrimTrackError::TrackerError {
                message: format!("{} tracker rejected the initial box", self.kind),
            });
        }
        self.inner = Some(tracker);
        Ok(())
    }

    fn update(&mut self, frame: &VideoFrame) -> TrimTrackResult<Option<BBox>> {
        let Some(tracker) = self.inner.as_mut() else {
            return Ok(None);
        };
        let mat = frame_to_mat(frame)?;
        // A tracker that errors out mid-stream counts as a lost target
        match tracker.update(&mat) {
            Ok(bbox) => Ok(bbox),
            Err(e) => {
                trace!(kind = %self.kind, error = %e, "Tracker update failed");
                Ok(None)
            }
        }
    }
}

/// Creates [`OpenCvTracker`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvTrackerFactory;

impl TrackerFactory for OpenCvTrackerFactory {
    fn create(&self, kind: TrackerKind) -> TrimTrackResult<Box<dyn ObjectTracker>> {
        Ok(Box::new(OpenCvTracker::new(kind)))
    }
}
