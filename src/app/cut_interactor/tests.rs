// Unit tests for cut planning

use super::*;

fn info() -> VideoInfo {
    // 10 s at 30 fps
    VideoInfo::new("/videos/walk.mp4", 1920, 1080, 30.0, 300)
}

fn secs(seconds: f64) -> Option<TimeSpec> {
    Some(TimeSpec::from_seconds(seconds))
}

#[test]
fn test_default_selection_is_whole_video_full_frame() {
    let selection = plan_selection(&info(), &CutOptions::new("walk.mp4")).unwrap();
    assert_eq!(selection.start_frame, 0);
    assert_eq!(selection.end_frame, 299);
    assert!(selection.crop.is_full());
}

#[test]
fn test_start_and_end_map_to_frames() {
    let mut options = CutOptions::new("walk.mp4");
    options.start = secs(2.0);
    options.end = secs(5.5);

    let selection = plan_selection(&info(), &options).unwrap();
    assert_eq!(selection.start_frame, 60);
    assert_eq!(selection.end_frame, 165);
    assert_eq!(selection.frame_count(), 105);
}

#[test]
fn test_duration_is_capped_at_last_frame() {
    let mut options = CutOptions::new("walk.mp4");
    options.start = secs(8.0);
    options.duration = Some(5.0);

    let selection = plan_selection(&info(), &options).unwrap();
    assert_eq!(selection.start_frame, 240);
    assert_eq!(selection.end_frame, 299);
}

#[test]
fn test_end_past_video_is_clamped() {
    let mut options = CutOptions::new("walk.mp4");
    options.end = secs(60.0);
    assert_eq!(plan_selection(&info(), &options).unwrap().end_frame, 299);
}

#[test]
fn test_rejects_inverted_and_out_of_range_times() {
    let mut options = CutOptions::new("walk.mp4");
    options.start = secs(5.0);
    options.end = secs(4.0);
    assert!(matches!(
        plan_selection(&info(), &options),
        Err(DomainError::InvalidTimeRange(_))
    ));

    let mut options = CutOptions::new("walk.mp4");
    options.start = secs(30.0);
    assert!(matches!(
        plan_selection(&info(), &options),
        Err(DomainError::InvalidTimeRange(_))
    ));
}

#[test]
fn test_end_and_duration_are_exclusive() {
    let mut options = CutOptions::new("walk.mp4");
    options.end = secs(4.0);
    options.duration = Some(2.0);
    assert!(matches!(plan_selection(&info(), &options), Err(DomainError::BadArgs(_))));
}

#[test]
fn test_aspect_shrinks_crop_around_center() {
    let mut options = CutOptions::new("walk.mp4");
    options.aspect = AspectRatio::Square;

    let crop = plan_selection(&info(), &options).unwrap().crop;
    // 1:1 on 16:9 keeps the full height and 9/16 of the width
    assert!((crop.h - 1.0).abs() < 1e-9);
    assert!((crop.w - 0.5625).abs() < 1e-9);
    assert!((crop.x - 0.21875).abs() < 1e-9);

    let rect = crop.to_pixels(1920, 1080).unwrap();
    assert_eq!((rect.width, rect.height), (1080, 1080));
}

#[test]
fn test_explicit_crop_is_kept_in_free_mode() {
    let mut options = CutOptions::new("walk.mp4");
    options.crop = Some(CropRegion::new(0.1, 0.2, 0.5, 0.5).unwrap());

    let crop = plan_selection(&info(), &options).unwrap().crop;
    assert_eq!(crop, CropRegion::new(0.1, 0.2, 0.5, 0.5).unwrap());
}

#[test]
fn test_single_frame_video_cannot_be_cut() {
    let tiny = VideoInfo::new("one.mp4", 64, 64, 30.0, 1);
    assert!(plan_selection(&tiny, &CutOptions::new("one.mp4")).is_err());
}
