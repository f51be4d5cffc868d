// Domain rules - Geometry, scheduling and naming policies

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Intersection over union of two boxes
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let inter = BBox::new(a.x1.max(b.x1), a.y1.max(b.y1), a.x2.min(b.x2), a.y2.min(b.y2)).area();
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Greedy non-maximum suppression; returns survivors sorted by confidence, highest first
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        if kept
            .iter()
            .all(|k| iou(&k.bbox, &candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Detection with the largest box area
pub fn largest_detection(detections: &[Detection]) -> Option<Detection> {
    detections
        .iter()
        .copied()
        .max_by(|a, b| a.bbox.area().partial_cmp(&b.bbox.area()).unwrap_or(Ordering::Equal))
}

/// Letterbox geometry for fitting an image into a square model input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub size: u32,
    pub scale: f32,
    pub new_width: u32,
    pub new_height: u32,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// Gray used for the padding
    pub const PAD_VALUE: u8 = 114;

    pub fn compute(width: u32, height: u32, size: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 || size == 0 {
            return Err(DomainError::BadArgs(format!(
                "Cannot letterbox {}x{} into {}",
                width, height, size
            )));
        }
        let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).clamp(1, size);
        let new_height = ((height as f32 * scale) as u32).clamp(1, size);
        Ok(Self {
            size,
            scale,
            new_width,
            new_height,
            pad_x: (size - new_width) / 2,
            pad_y: (size - new_height) / 2,
        })
    }

    /// Map a box in model input space back onto the source image
    pub fn restore(&self, bbox: &BBox) -> BBox {
        let px = self.pad_x as f32;
        let py = self.pad_y as f32;
        BBox::new(
            (bbox.x1 - px) / self.scale,
            (bbox.y1 - py) / self.scale,
            (bbox.x2 - px) / self.scale,
            (bbox.y2 - py) / self.scale,
        )
    }
}

/// Stable overlay color (BGR) for a track id, channels in 50..=255
pub fn color_for_id(id: u32) -> [u8; 3] {
    let mut rng = StdRng::seed_from_u64(u64::from(id) * 100);
    [
        rng.gen_range(50..=255),
        rng.gen_range(50..=255),
        rng.gen_range(50..=255),
    ]
}

/// Whether the 1-based frame number is processed under the given skip setting
pub fn should_process_frame(frame_number: u64, skip_frames: u32) -> bool {
    frame_number >= 1 && (frame_number - 1) % (u64::from(skip_frames) + 1) == 0
}

/// Output frame rate when only every (skip+1)-th frame is kept
pub fn output_fps(fps: f64, skip_frames: u32) -> f64 {
    effective_fps(fps) / (f64::from(skip_frames) + 1.0)
}

/// Whether the detector should run on this processed frame
pub fn should_detect(frame_count: u64, redetect_interval: u32, has_tracks: bool) -> bool {
    frame_count == 1
        || (redetect_interval > 0 && frame_count % u64::from(redetect_interval) == 0)
        || !has_tracks
}

/// Confidence of a tracker-only position after some frames without a detection
pub fn decayed_confidence(frames_since_detection: u32) -> f32 {
    (1.0 - frames_since_detection as f32 * 0.02).max(0.3)
}

/// File name for an exported clip: `<YYYYmmdd_HHMMSS>_<seconds>s.mp4`
pub fn clip_file_name<Tz: TimeZone>(now: &DateTime<Tz>, frame_count: u64, fps: f64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let seconds = (frame_count as f64 / effective_fps(fps)).round() as u64;
    format!("{}_{}s.mp4", now.format("%Y%m%d_%H%M%S"), seconds)
}

/// Default tracking output next to the input: `<stem>_tracked<.ext>`
pub fn tracked_output_path(input: &Path) -> PathBuf {
    suffixed_path(input, "_tracked")
}

/// Default annotated image next to the input: `<stem>_detected<.ext>`
pub fn detected_output_path(input: &Path) -> PathBuf {
    suffixed_path(input, "_detected")
}

fn suffixed_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    input.with_file_name(file_name)
}
