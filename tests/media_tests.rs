//! Round trips through the libav encoder and decoder

use std::path::Path;

use trimtrack_cli::domain::model::{CropRegion, VideoFrame};
use trimtrack_cli::engine::{ClipCutter, CutOutcome, CutRequest, ProgressTracker};
use trimtrack_cli::media::{probe, FfmpegSinkFactory, FrameReader, FrameWriter};
use trimtrack_cli::ports::{FrameSink, FrameSource};

fn gray(index: u64) -> u8 {
    (index * 5 % 250) as u8
}

/// 64x48 clip at 10 fps whose frames get brighter over time
fn write_ramp(path: &Path, frames: u64) {
    let mut writer = FrameWriter::create(path, 64, 48, 10.0).unwrap();
    for i in 0..frames {
        let level = gray(i);
        writer.write(&VideoFrame::filled(i, 64, 48, [level, level, level])).unwrap();
    }
    writer.finish().unwrap();
}

fn center_level(frame: &VideoFrame) -> i32 {
    i32::from(frame.pixel(frame.width / 2, frame.height / 2).unwrap()[1])
}

#[test]
fn test_written_video_probes_and_decodes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.mp4");
    write_ramp(&path, 40);

    let info = probe(&path).unwrap();
    assert_eq!((info.width, info.height), (64, 48));
    assert!((info.fps - 10.0).abs() < 0.01);
    assert!((39..=41).contains(&info.total_frames));

    let mut reader = FrameReader::open(&path).unwrap();
    let mut decoded = Vec::new();
    while let Some(frame) = reader.read().unwrap() {
        decoded.push(frame);
    }
    assert_eq!(decoded.len(), 40);
    assert_eq!(decoded[0].index, 0);
    assert_eq!(decoded[39].index, 39);
    assert!((center_level(&decoded[30]) - i32::from(gray(30))).abs() < 16);
}

#[test]
fn test_seek_lands_on_requested_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ramp.mp4");
    write_ramp(&path, 40);

    let mut reader = FrameReader::open(&path).unwrap();
    let frame = reader.read_at(25).unwrap().unwrap();
    assert_eq!(frame.index, 25);
    assert_eq!(reader.read().unwrap().unwrap().index, 26);

    // Backwards works too
    assert_eq!(reader.read_at(3).unwrap().unwrap().index, 3);
}

#[test]
fn test_cut_real_file_with_crop() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.mp4");
    let output = dir.path().join("clip.mp4");
    write_ramp(&input, 40);

    let mut source = FrameReader::open(&input).unwrap();
    let request = CutRequest {
        start_frame: 10,
        end_frame: 30,
        crop: CropRegion::new(0.25, 0.0, 0.5, 1.0).unwrap(),
        output: output.clone(),
    };
    let outcome = ClipCutter::new(&FfmpegSinkFactory)
        .cut(&mut source, &request, &ProgressTracker::new("cut"))
        .unwrap();
    let CutOutcome::Completed(report) = outcome else {
        panic!("export was not completed");
    };
    assert_eq!(report.frames_written, 20);

    let info = probe(&output).unwrap();
    assert_eq!((info.width, info.height), (32, 48));
    let mut clip = FrameReader::open(&output).unwrap();
    let first = clip.read().unwrap().unwrap();
    assert!((center_level(&first) - i32::from(gray(10))).abs() < 16);
}

#[test]
fn test_probe_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = probe(&dir.path().join("missing.mp4")).unwrap_err();
    assert!(err.to_string().contains("not found"));
}
