// Unit tests for the timeline and playback pacing

use super::*;

#[test]
fn test_set_range_resets_selection() {
    let mut timeline = Timeline::new(0, 99);
    timeline.set_start(10);
    timeline.set_end(20);
    timeline.set_preview(15);

    timeline.set_range(0, 299);
    assert_eq!(
        (timeline.start(), timeline.end(), timeline.preview()),
        (0, 299, 0)
    );
}

#[test]
fn test_start_end_clamping() {
    let mut timeline = Timeline::new(0, 99);
    timeline.set_end(50);
    timeline.set_start(80);
    assert_eq!(timeline.start(), 49);

    timeline.set_end(10);
    assert_eq!(timeline.end(), 50);

    timeline.set_end(500);
    assert_eq!(timeline.end(), 99);

    timeline.set_preview(1000);
    assert_eq!(timeline.preview(), 99);
}

#[test]
fn test_single_frame_timeline() {
    let mut timeline = Timeline::for_frames(1);
    timeline.set_start(5);
    timeline.set_end(5);
    assert_eq!((timeline.start(), timeline.end()), (0, 0));
    assert_eq!(timeline.selected_frames(), 0);
}

#[test]
fn test_preview_as_start_pushes_end() {
    let mut timeline = Timeline::new(0, 99);
    timeline.set_end(40);
    timeline.set_preview(70);
    timeline.set_preview_as_start();
    assert_eq!(timeline.end(), 70);
    assert_eq!(timeline.start(), 69);

    timeline.set_preview(30);
    timeline.set_preview_as_start();
    assert_eq!((timeline.start(), timeline.end()), (30, 70));
}

#[test]
fn test_preview_as_end_pulls_start() {
    let mut timeline = Timeline::new(0, 99);
    timeline.set_start(50);
    timeline.set_preview(20);
    timeline.set_preview_as_end();
    assert_eq!((timeline.start(), timeline.end()), (20, 21));

    timeline.set_preview(60);
    timeline.set_preview_as_end();
    assert_eq!((timeline.start(), timeline.end()), (20, 60));
}

#[test]
fn test_set_duration() {
    let mut timeline = Timeline::for_frames(900);
    timeline.set_start(100);
    timeline.set_duration(10.0, 30.0, 900).unwrap();
    assert_eq!(timeline.end(), 400);

    timeline.set_duration(60.0, 30.0, 900).unwrap();
    assert_eq!(timeline.end(), 899);

    assert!(timeline.set_duration(0.0, 30.0, 900).is_err());
    assert_eq!(DURATION_PRESETS.first(), Some(&5));
    assert_eq!(DURATION_PRESETS.last(), Some(&60));
}

#[test]
fn test_selection_label() {
    let mut timeline = Timeline::for_frames(3000);
    timeline.set_start(300);
    timeline.set_end(2100);
    assert_eq!(
        timeline.selection_label(30.0),
        "00:00:10 - 00:01:10 (00:01:00, 1800 frames)"
    );
}

#[test]
fn test_playback_skip_and_interval() {
    let mut playback = Playback::new(30.0);
    assert_eq!(playback.frame_skip(), 1);
    assert_eq!(playback.interval(), Duration::from_millis(33));

    playback.set_speed(0.5).unwrap();
    assert_eq!(playback.interval(), Duration::from_millis(66));

    playback.set_speed(2.0).unwrap();
    assert_eq!(playback.frame_skip(), 2);
    assert_eq!(playback.interval(), Duration::from_millis(33));

    playback.set_speed(4.0).unwrap();
    assert_eq!(playback.frame_skip(), 4);

    assert!(playback.set_speed(3.0).is_err());
}

#[test]
fn test_playback_interval_floor() {
    let mut playback = Playback::new(240.0);
    playback.set_speed(1.0).unwrap();
    assert_eq!(playback.interval(), Duration::from_millis(10));
}

#[test]
fn test_range_playback_stops_at_end() {
    let mut timeline = Timeline::for_frames(100);
    timeline.set_start(10);
    timeline.set_end(15);
    timeline.set_preview(80);

    let mut playback = Playback::new(30.0);
    playback.set_speed(2.0).unwrap();
    playback.start(PlaybackMode::Range, &mut timeline);
    assert_eq!(timeline.preview(), 10);

    let mut visited = Vec::new();
    while let Some(advance) = playback.tick(&mut timeline, 100, None) {
        visited.push((advance.from, advance.to, advance.frames));
    }
    assert_eq!(visited, vec![(10, 12, 2), (12, 14, 2), (14, 15, 1)]);
    assert!(!playback.is_playing());
}

#[test]
fn test_full_playback_runs_to_last_frame() {
    let mut timeline = Timeline::for_frames(10);
    timeline.set_preview(7);
    let mut playback = Playback::new(30.0);
    playback.start(PlaybackMode::Full, &mut timeline);
    assert_eq!(timeline.preview(), 7);

    let steps: Vec<Advance> = std::iter::from_fn(|| playback.tick(&mut timeline, 10, None)).collect();
    assert_eq!(steps.len(), 2);
    assert_eq!(timeline.preview(), 9);
}

#[test]
fn test_adaptive_skip_at_top_speed() {
    let mut timeline = Timeline::for_frames(10_000);
    let mut playback = Playback::new(30.0);
    playback.set_speed(4.0).unwrap();
    playback.start(PlaybackMode::Full, &mut timeline);

    // Expected 4 / 120 s per tick; 100 ms is far behind
    let slow = Some(Duration::from_millis(100));
    playback.tick(&mut timeline, 10_000, slow);
    assert_eq!(playback.frame_skip(), 6);
    playback.tick(&mut timeline, 10_000, slow);
    assert_eq!(playback.frame_skip(), 8);
    playback.tick(&mut timeline, 10_000, slow);
    assert_eq!(playback.frame_skip(), 8);

    let mut normal = Playback::new(30.0);
    normal.set_speed(2.0).unwrap();
    normal.start(PlaybackMode::Full, &mut timeline);
    normal.tick(&mut timeline, 10_000, slow);
    assert_eq!(normal.frame_skip(), 2);
}

#[test]
fn test_stopped_playback_does_not_advance() {
    let mut timeline = Timeline::for_frames(10);
    let mut playback = Playback::new(30.0);
    assert!(playback.tick(&mut timeline, 10, None).is_none());
    assert_eq!(timeline.preview(), 0);
}
