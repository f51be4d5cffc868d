use super::mat::*;
use super::*;
use crate::domain::model::{BBox, Detection, TrackMethod, TrackResult, TrackerKind, VideoFrame};
use crate::domain::rules::color_for_id;
use crate::ports::{FrameAnnotator, ObjectTracker, OverlayStats};

#[test]
fn test_frame_mat_round_trip() {
    let mut frame = VideoFrame::filled(0, 8, 4, [1, 2, 3]);
    frame.data[0] = 200;

    let mat = frame_to_mat(&frame).unwrap();
    let mut back = VideoFrame::filled(0, 8, 4, [0, 0, 0]);
    mat_into_frame(&mat, &mut back).unwrap();
    assert_eq!(back, frame);

    let mut wrong_size = VideoFrame::filled(0, 4, 4, [0, 0, 0]);
    assert!(mat_into_frame(&mat, &mut wrong_size).is_err());
}

#[test]
fn test_box_conversions_truncate() {
    let rect = bbox_to_rect(&BBox::new(10.7, 20.2, 110.9, 220.5));
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (10, 20, 100, 200));
    assert_eq!(rect_to_bbox(&rect), BBox::new(10.0, 20.0, 110.0, 220.0));

    let rect2d = opencv::core::Rect2d::new(5.9, 6.1, 30.5, 40.9);
    assert_eq!(rect2d_to_bbox(&rect2d), BBox::new(5.0, 6.0, 35.0, 46.0));
}

#[test]
fn test_annotate_draws_track_in_id_color() {
    let mut frame = VideoFrame::filled(0, 200, 200, [0, 0, 0]);
    let results = [TrackResult {
        id: 1,
        bbox: BBox::new(50.0, 60.0, 150.0, 160.0),
        confidence: 1.0,
        method: TrackMethod::Yolo,
    }];
    let stats = OverlayStats {
        active_tracks: 1,
        total_ids: 1,
        fps: 12.5,
    };

    OpenCvAnnotator.annotate(&mut frame, &results, &stats).unwrap();

    assert_eq!(frame.pixel(50, 120), Some(color_for_id(1)));
    assert_eq!(frame.pixel(100, 120), Some([0, 0, 0]));
}

#[test]
fn test_annotate_detections_draws_green() {
    let mut frame = VideoFrame::filled(0, 100, 100, [0, 0, 0]);
    let detections = [Detection::new(BBox::new(20.0, 30.0, 80.0, 90.0), 0.93)];

    OpenCvAnnotator.annotate_detections(&mut frame, &detections).unwrap();

    assert_eq!(frame.pixel(20, 60), Some([0, 255, 0]));
}

#[test]
fn test_tracker_rejects_empty_box_and_is_idle_before_init() {
    let frame = VideoFrame::filled(0, 64, 64, [10, 10, 10]);
    let mut tracker = OpenCvTracker::new(TrackerKind::Kcf);

    assert_eq!(tracker.update(&frame).unwrap(), None);
    assert!(tracker.init(&frame, &BBox::new(10.0, 10.0, 10.0, 40.0)).is_err());
    assert_eq!(tracker.update(&frame).unwrap(), None);
}
