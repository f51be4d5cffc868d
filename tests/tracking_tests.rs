//! Multi-person tracking and video processing with scripted detector and trackers

mod common;

use std::sync::{Arc, Mutex};

use common::{DriftTrackers, MemorySinks, MemorySource, ScriptedDetector};
use trimtrack_cli::domain::model::{BBox, Detection, TrackMethod, TrackResult, TrackerKind, VideoFrame};
use trimtrack_cli::engine::{CancelFlag, MultiPersonTracker, ProgressTracker, TrackingParams, VideoProcessor};
use trimtrack_cli::ports::{FrameAnnotator, OverlayStats, PersonDetector};
use trimtrack_cli::TrimTrackResult;

fn frame(index: u64) -> VideoFrame {
    VideoFrame::filled(index, 640, 360, [0, 0, 0])
}

fn person(x: f32) -> BBox {
    BBox::new(x, 10.0, x + 40.0, 90.0)
}

fn params(redetect_interval: u32) -> TrackingParams {
    TrackingParams {
        redetect_interval,
        ..TrackingParams::default()
    }
}

fn tracker_with(script: Vec<Vec<BBox>>, trackers: DriftTrackers, params: TrackingParams) -> (MultiPersonTracker, Arc<Mutex<Vec<u64>>>) {
    let detector = ScriptedDetector::new(script);
    let calls = Arc::clone(&detector.calls);
    (MultiPersonTracker::new(Box::new(detector), Arc::new(trackers), params), calls)
}

fn by_id(mut results: Vec<TrackResult>) -> Vec<TrackResult> {
    results.sort_by_key(|r| r.id);
    results
}

#[test]
fn test_first_frame_detects_and_assigns_ids() {
    let (mut tracker, _) = tracker_with(
        vec![vec![person(10.0), person(200.0)]],
        DriftTrackers::default(),
        params(30),
    );

    let results = by_id(tracker.process_frame(&frame(1)).unwrap());
    assert_eq!(results.len(), 2);
    assert_eq!((results[0].id, results[1].id), (1, 2));
    assert!(results.iter().all(|r| r.method == TrackMethod::Yolo));
    assert!(results.iter().all(|r| r.confidence == 0.9));
    assert_eq!(tracker.total_ids(), 2);
    // New tracks are not stepped on the frame that created them
    assert!(tracker
        .active_tracks()
        .iter()
        .all(|t| t.frames_since_detection == 0));
}

#[test]
fn test_trackers_fill_in_between_detections() {
    let trackers = DriftTrackers {
        step: 2.0,
        ..DriftTrackers::default()
    };
    let (mut tracker, calls) = tracker_with(vec![vec![person(10.0)]], trackers, params(10));

    tracker.process_frame(&frame(1)).unwrap();
    let second = tracker.process_frame(&frame(2)).unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].method, TrackMethod::Tracker);
    assert_eq!(second[0].bbox, person(12.0));
    assert!((second[0].confidence - 0.98).abs() < 1e-6);

    for n in 3..=9 {
        tracker.process_frame(&frame(n)).unwrap();
    }
    // Two points of confidence lost per tracked frame
    let state = tracker.active_tracks();
    assert_eq!(state[0].frames_since_detection, 8);
    assert!((state[0].confidence - 0.84).abs() < 1e-6);
    assert_eq!(*calls.lock().unwrap(), vec![1]);
}

#[test]
fn test_redetection_matches_moves_and_adds() {
    let trackers = DriftTrackers {
        step: 2.0,
        ..DriftTrackers::default()
    };
    let script = vec![
        vec![person(10.0), person(200.0)],
        // Person 1 moved a little, person 2 missed, a newcomer appears
        vec![person(30.0), person(400.0)],
    ];
    let (mut tracker, calls) = tracker_with(script, trackers, params(10));

    for n in 1..=9 {
        tracker.process_frame(&frame(n)).unwrap();
    }
    let results = by_id(tracker.process_frame(&frame(10)).unwrap());
    assert_eq!(*calls.lock().unwrap(), vec![1, 10]);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].id, 1);
    assert_eq!(results[0].method, TrackMethod::Yolo);
    assert_eq!(results[0].bbox, person(30.0));
    assert_eq!(results[1].id, 2);
    assert_eq!(results[1].method, TrackMethod::Tracker);
    assert_eq!(results[2].id, 3);
    assert_eq!(results[2].method, TrackMethod::Yolo);

    let matched = tracker.active_tracks().into_iter().find(|t| t.id == 1).unwrap();
    assert_eq!(matched.frames_since_detection, 0);
    assert_eq!(matched.confidence, 1.0);
}

#[test]
fn test_far_jump_opens_new_track() {
    let script = vec![vec![person(10.0)], vec![person(300.0)]];
    let (mut tracker, _) = tracker_with(script, DriftTrackers::default(), params(10));

    for n in 1..=9 {
        tracker.process_frame(&frame(n)).unwrap();
    }
    let results = by_id(tracker.process_frame(&frame(10)).unwrap());
    let ids: Vec<u32> = results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(results[1].method, TrackMethod::Yolo);
}

#[test]
fn test_one_track_matches_at_most_one_detection() {
    // Both detections overlap track 1; the first takes it
    let script = vec![vec![person(10.0)], vec![person(12.0), person(14.0)]];
    let (mut tracker, _) = tracker_with(script, DriftTrackers::default(), params(10));

    for n in 1..=9 {
        tracker.process_frame(&frame(n)).unwrap();
    }
    let results = by_id(tracker.process_frame(&frame(10)).unwrap());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].bbox, person(12.0));
    assert_eq!(results[1].id, 2);
    assert_eq!(results[1].bbox, person(14.0));
}

#[test]
fn test_lost_track_is_dropped_after_max_lost_frames() {
    let trackers = DriftTrackers {
        lose_after: Some(2),
        ..DriftTrackers::default()
    };
    let (mut tracker, calls) = tracker_with(vec![vec![person(10.0)]], trackers, params(10));

    tracker.process_frame(&frame(1)).unwrap();
    assert_eq!(tracker.process_frame(&frame(2)).unwrap().len(), 1);
    assert_eq!(tracker.process_frame(&frame(3)).unwrap().len(), 1);

    for n in 4..=13 {
        assert!(tracker.process_frame(&frame(n)).unwrap().is_empty());
    }
    assert_eq!(tracker.active_tracks()[0].lost_frames, 10);

    tracker.process_frame(&frame(14)).unwrap();
    assert!(tracker.active_tracks().is_empty());

    // With no tracks left the detector runs on every frame
    tracker.process_frame(&frame(15)).unwrap();
    tracker.process_frame(&frame(16)).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![1, 10, 15, 16]);
}

#[test]
fn test_reset_restarts_ids_and_frame_count() {
    let script = vec![vec![person(10.0)], vec![person(200.0)]];
    let (mut tracker, _) = tracker_with(script, DriftTrackers::default(), params(30));

    tracker.process_frame(&frame(1)).unwrap();
    tracker.reset();
    assert_eq!(tracker.frame_count(), 0);
    assert_eq!(tracker.total_ids(), 0);

    let results = tracker.process_frame(&frame(2)).unwrap();
    assert_eq!(results[0].id, 1);
    assert_eq!(results[0].bbox, person(200.0));
}

#[test]
fn test_factory_receives_configured_kind() {
    let trackers = Arc::new(DriftTrackers::default());
    let detector = ScriptedDetector::new(vec![vec![person(10.0), person(200.0)]]);
    let mut tracker = MultiPersonTracker::new(
        Box::new(detector),
        Arc::clone(&trackers) as Arc<dyn trimtrack_cli::ports::TrackerFactory>,
        TrackingParams {
            kind: TrackerKind::Mosse,
            ..TrackingParams::default()
        },
    );

    tracker.process_frame(&frame(1)).unwrap();
    assert_eq!(*trackers.created.lock().unwrap(), vec![TrackerKind::Mosse, TrackerKind::Mosse]);
}

#[test]
fn test_largest_person_by_area() {
    let mut detector = ScriptedDetector::new(vec![
        vec![person(10.0), BBox::new(100.0, 0.0, 300.0, 200.0), person(400.0)],
        vec![],
    ]);

    let largest = detector.detect_largest_person(&frame(1)).unwrap().unwrap();
    assert_eq!(largest.bbox, BBox::new(100.0, 0.0, 300.0, 200.0));
    assert!(detector.detect_largest_person(&frame(2)).unwrap().is_none());
}

/// Records overlay stats; cancels a flag after a number of frames
struct RecordingAnnotator {
    overlays: Mutex<Vec<OverlayStats>>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl RecordingAnnotator {
    fn new() -> Self {
        Self {
            overlays: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }
}

impl FrameAnnotator for RecordingAnnotator {
    fn annotate(&self, _frame: &mut VideoFrame, _results: &[TrackResult], stats: &OverlayStats) -> TrimTrackResult<()> {
        let mut overlays = self.overlays.lock().unwrap();
        overlays.push(*stats);
        if let Some((after, flag)) = &self.cancel_after {
            if overlays.len() >= *after {
                flag.cancel();
            }
        }
        Ok(())
    }

    fn annotate_detections(&self, _frame: &mut VideoFrame, _detections: &[Detection]) -> TrimTrackResult<()> {
        Ok(())
    }
}

fn processor(annotator: Arc<RecordingAnnotator>, sinks: &MemorySinks) -> VideoProcessor {
    let tracker = MultiPersonTracker::new(
        Box::new(ScriptedDetector::new(vec![vec![person(10.0)]])),
        Arc::new(DriftTrackers::default()),
        params(10),
    );
    VideoProcessor::new(tracker, annotator, Arc::new(sinks.clone()))
}

#[test]
fn test_processor_skips_frames_and_writes_at_reduced_rate() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("walk_tracked.mp4");
    let sinks = MemorySinks::default();
    let annotator = Arc::new(RecordingAnnotator::new());
    let mut processor = processor(Arc::clone(&annotator), &sinks);
    let mut source = MemorySource::new(64, 48, 30.0, 12);

    let stats = processor
        .process_video(&mut source, Some(&output), 1, &ProgressTracker::new("track"), None)
        .unwrap();

    assert_eq!(stats.total_frames, 6);
    assert_eq!(stats.yolo_frames, 1);
    assert_eq!(stats.tracker_frames, 5);
    assert_eq!(stats.total_persons, 1);
    assert!(!stats.stopped);

    let recorded = sinks.recorded.lock().unwrap();
    assert_eq!(recorded.fps, 15.0);
    assert!(recorded.finished);
    let indices: Vec<u64> = recorded.frames.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 2, 4, 6, 8, 10]);

    let overlays = annotator.overlays.lock().unwrap();
    assert_eq!(overlays.len(), 6);
    assert_eq!(overlays[0].active_tracks, 1);
    assert_eq!(overlays[0].total_ids, 1);
}

#[test]
fn test_processor_trims_odd_frames_and_feeds_preview() {
    let dir = tempfile::tempdir().unwrap();
    let sinks = MemorySinks::default();
    let mut processor = processor(Arc::new(RecordingAnnotator::new()), &sinks);
    let mut source = MemorySource::new(65, 49, 25.0, 4);
    let mut previewed = Vec::new();
    let mut preview = |f: &VideoFrame| previewed.push((f.width, f.height));

    processor
        .process_video(
            &mut source,
            Some(&dir.path().join("odd.mp4")),
            0,
            &ProgressTracker::new("track"),
            Some(&mut preview),
        )
        .unwrap();

    let recorded = sinks.recorded.lock().unwrap();
    assert_eq!((recorded.width, recorded.height), (64, 48));
    assert_eq!(recorded.frames.len(), 4);
    assert_eq!(previewed, vec![(64, 48); 4]);
}

#[test]
fn test_stopping_keeps_frames_written_so_far() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("stopped.mp4");
    let sinks = MemorySinks::default();
    let cancel = CancelFlag::new();
    let annotator = Arc::new(RecordingAnnotator {
        overlays: Mutex::new(Vec::new()),
        cancel_after: Some((3, cancel.clone())),
    });
    let mut processor = processor(annotator, &sinks);
    let mut source = MemorySource::new(64, 48, 30.0, 100);

    let stats = processor
        .process_video(
            &mut source,
            Some(&output),
            0,
            &ProgressTracker::with_cancel_flag("track", cancel),
            None,
        )
        .unwrap();

    assert!(stats.stopped);
    assert_eq!(stats.total_frames, 3);
    assert_eq!(sinks.frames().len(), 3);
    assert!(sinks.recorded.lock().unwrap().finished);
    assert!(output.exists());
}

#[test]
fn test_stop_flag_ends_run_after_current_frame() {
    let dir = tempfile::tempdir().unwrap();
    let sinks = MemorySinks::default();
    let tracker = MultiPersonTracker::new(
        Box::new(ScriptedDetector::new(vec![vec![person(10.0)]])),
        Arc::new(DriftTrackers::default()),
        params(10),
    );
    let annotator = Arc::new(RecordingAnnotator::new());
    let mut processor = VideoProcessor::new(tracker, annotator, Arc::new(sinks.clone()));
    let stop = processor.stop_flag();
    let mut source = MemorySource::new(64, 48, 30.0, 100);
    let mut preview = |f: &VideoFrame| {
        if f.index == 4 {
            stop.cancel();
        }
    };

    let stats = processor
        .process_video(
            &mut source,
            Some(&dir.path().join("stopped.mp4")),
            0,
            &ProgressTracker::new("track"),
            Some(&mut preview),
        )
        .unwrap();

    assert!(stats.stopped);
    assert_eq!(stats.total_frames, 5);
    assert_eq!(processor.stats().total_frames, 5);
    assert_eq!(sinks.frames().len(), 5);
}

#[test]
fn test_processor_without_output_only_tracks() {
    let sinks = MemorySinks::default();
    let mut processor = processor(Arc::new(RecordingAnnotator::new()), &sinks);
    let mut source = MemorySource::new(64, 48, 30.0, 5);

    let stats = processor
        .process_video(&mut source, None, 0, &ProgressTracker::new("track"), None)
        .unwrap();
    assert_eq!(stats.total_frames, 5);
    assert!(sinks.recorded.lock().unwrap().path.is_none());
}
