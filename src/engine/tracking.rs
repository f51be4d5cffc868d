//! Multi-person tracking: periodic detection, IoU matching, tracker fill-in

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::domain::model::{BBox, Detection, TrackMethod, TrackResult, TrackerKind, VideoFrame};
use crate::domain::rules::{decayed_confidence, iou, should_detect};
use crate::error::TrimTrackResult;
use crate::ports::{ObjectTracker, PersonDetector, TrackerFactory};

/// Tracking parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingParams {
    pub kind: TrackerKind,
    /// Run the detector every this many processed frames
    pub redetect_interval: u32,
    /// A detection must overlap a track by more than this to continue it
    pub match_iou_threshold: f32,
    /// Consecutive tracker failures tolerated before a track is dropped
    pub max_lost_frames: u32,
}

impl Default for TrackingParams {
    fn default() -> Self {
        Self {
            kind: TrackerKind::Csrt,
            redetect_interval: 30,
            match_iou_threshold: 0.3,
            max_lost_frames: 10,
        }
    }
}

struct TrackedPerson {
    id: u32,
    bbox: BBox,
    confidence: f32,
    frames_since_detection: u32,
    lost_frames: u32,
    active: bool,
    tracker: Box<dyn ObjectTracker>,
}

impl TrackedPerson {
    fn to_result(&self, method: TrackMethod) -> TrackResult {
        TrackResult {
            id: self.id,
            bbox: self.bbox,
            confidence: self.confidence,
            method,
        }
    }

    /// Advance with the visual tracker; false when the target was not found
    fn update_with_tracker(&mut self, frame: &VideoFrame, max_lost_frames: u32) -> bool {
        let found = match self.tracker.update(frame) {
            Ok(found) => found,
            Err(e) => {
                trace!(id = self.id, error = %e, "Tracker update failed");
                None
            }
        };
        match found {
            Some(bbox) => {
                self.bbox = bbox;
                self.frames_since_detection += 1;
                self.confidence = decayed_confidence(self.frames_since_detection);
                true
            }
            None => {
                self.lost_frames += 1;
                if self.lost_frames > max_lost_frames {
                    self.active = false;
                }
                false
            }
        }
    }
}

/// Snapshot of one live track, for inspection and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackState {
    pub id: u32,
    pub bbox: BBox,
    pub confidence: f32,
    pub frames_since_detection: u32,
    pub lost_frames: u32,
}

/// Tracks every person in a stream of frames
pub struct MultiPersonTracker {
    detector: Box<dyn PersonDetector>,
    trackers: Arc<dyn TrackerFactory>,
    params: TrackingParams,
    tracks: BTreeMap<u32, TrackedPerson>,
    next_id: u32,
    frame_count: u64,
}

impl MultiPersonTracker {
    pub fn new(
        detector: Box<dyn PersonDetector>,
        trackers: Arc<dyn TrackerFactory>,
        params: TrackingParams,
    ) -> Self {
        Self {
            detector,
            trackers,
            params,
            tracks: BTreeMap::new(),
            next_id: 1,
            frame_count: 0,
        }
    }

    pub fn params(&self) -> &TrackingParams {
        &self.params
    }

    /// Processed frames since the last reset
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Ids handed out so far
    pub fn total_ids(&self) -> u32 {
        self.next_id - 1
    }

    pub fn active_tracks(&self) -> Vec<TrackState> {
        self.tracks
            .values()
            .map(|p| TrackState {
                id: p.id,
                bbox: p.bbox,
                confidence: p.confidence,
                frames_since_detection: p.frames_since_detection,
                lost_frames: p.lost_frames,
            })
            .collect()
    }

    /// Forget all tracks; ids restart at 1
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 1;
        self.frame_count = 0;
    }

    /// Track one frame; returns every track that has a position in it
    pub fn process_frame(&mut self, frame: &VideoFrame) -> TrimTrackResult<Vec<TrackResult>> {
        self.frame_count += 1;

        let results = if should_detect(
            self.frame_count,
            self.params.redetect_interval,
            !self.tracks.is_empty(),
        ) {
            self.process_with_detector(frame)?
        } else {
            self.process_with_trackers(frame)
        };

        self.cleanup_inactive();
        Ok(results)
    }

    fn process_with_detector(&mut self, frame: &VideoFrame) -> TrimTrackResult<Vec<TrackResult>> {
        let detections = self.detector.detect(frame)?;
        debug!(frame = self.frame_count, detections = detections.len(), "Detection pass");
        if detections.is_empty() {
            return Ok(self.process_with_trackers(frame));
        }

        let mut results = Vec::new();
        let mut matched_tracks = BTreeSet::new();
        let mut matched_detections = BTreeSet::new();

        for (index, detection) in detections.iter().enumerate() {
            let Some(id) = self.best_match(&detection.bbox, &matched_tracks) else {
                continue;
            };
            if let Some(person) = self.tracks.get_mut(&id) {
                let tracker = Self::start_tracker(self.trackers.as_ref(), self.params.kind, frame, detection, id);
                person.tracker = tracker;
                person.bbox = detection.bbox;
                person.confidence = 1.0;
                person.frames_since_detection = 0;
                person.lost_frames = 0;
                results.push(TrackResult {
                    id,
                    bbox: detection.bbox,
                    confidence: detection.confidence,
                    method: TrackMethod::Yolo,
                });
            }
            matched_tracks.insert(id);
            matched_detections.insert(index);
        }

        let mut created = BTreeSet::new();
        for (index, detection) in detections.iter().enumerate() {
            if matched_detections.contains(&index) {
                continue;
            }
            let id = self.next_id;
            self.next_id += 1;
            let tracker = Self::start_tracker(self.trackers.as_ref(), self.params.kind, frame, detection, id);
            self.tracks.insert(
                id,
                TrackedPerson {
                    id,
                    bbox: detection.bbox,
                    confidence: 1.0,
                    frames_since_detection: 0,
                    lost_frames: 0,
                    active: true,
                    tracker,
                },
            );
            created.insert(id);
            debug!(id, bbox = ?detection.bbox, "New track");
            results.push(TrackResult {
                id,
                bbox: detection.bbox,
                confidence: detection.confidence,
                method: TrackMethod::Yolo,
            });
        }

        // Tracks the detector missed keep going on their trackers. Matched and
        // new tracks are not stepped on this frame: a tracker started on a frame
        // would only echo the detection as a second result, and its
        // frames_since_detection stays 0 until the next frame.
        let max_lost = self.params.max_lost_frames;
        for (id, person) in self.tracks.iter_mut() {
            if matched_tracks.contains(id) || created.contains(id) {
                continue;
            }
            if person.update_with_tracker(frame, max_lost) {
                results.push(person.to_result(TrackMethod::Tracker));
            }
        }

        Ok(results)
    }

    fn process_with_trackers(&mut self, frame: &VideoFrame) -> Vec<TrackResult> {
        let max_lost = self.params.max_lost_frames;
        self.tracks
            .values_mut()
            .filter(|person| person.active)
            .filter_map(|person| {
                person
                    .update_with_tracker(frame, max_lost)
                    .then(|| person.to_result(TrackMethod::Tracker))
            })
            .collect()
    }

    /// Unmatched track overlapping `bbox` the most, above the match threshold
    fn best_match(&self, bbox: &BBox, taken: &BTreeSet<u32>) -> Option<u32> {
        let mut best: Option<(u32, f32)> = None;
        for (id, person) in &self.tracks {
            if taken.contains(id) {
                continue;
            }
            let overlap = iou(bbox, &person.bbox);
            if overlap > self.params.match_iou_threshold && best.map_or(true, |(_, b)| overlap > b) {
                best = Some((*id, overlap));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Fresh tracker on the detection; a failed start leaves a tracker that reports lost
    fn start_tracker(
        factory: &dyn TrackerFactory,
        kind: TrackerKind,
        frame: &VideoFrame,
        detection: &Detection,
        id: u32,
    ) -> Box<dyn ObjectTracker> {
        let mut tracker = match factory.create(kind) {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(id, error = %e, "Failed to create tracker");
                return Box::new(LostTracker);
            }
        };
        if let Err(e) = tracker.init(frame, &detection.bbox) {
            warn!(id, error = %e, "Failed to start tracker");
            return Box::new(LostTracker);
        }
        tracker
    }

    fn cleanup_inactive(&mut self) {
        self.tracks.retain(|id, person| {
            if !person.active {
                debug!(id, "Track lost");
            }
            person.active
        });
    }
}

/// Stand-in for a tracker that could not be started
struct LostTracker;

impl ObjectTracker for LostTracker {
    fn init(&mut self, _frame: &VideoFrame, _bbox: &BBox) -> TrimTrackResult<()> {
        Ok(())
    }

    fn update(&mut self, _frame: &VideoFrame) -> TrimTrackResult<Option<BBox>> {
        Ok(None)
    }
}
