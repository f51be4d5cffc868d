// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Frame rate used whenever a container reports none
pub const FALLBACK_FPS: f64 = 30.0;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self { seconds: total }
    }

    /// Time of a frame index at the given rate
    pub fn from_frame(frame: u64, fps: f64) -> Self {
        Self::from_seconds(frame as f64 / effective_fps(fps))
    }

    /// Frame index at the given rate, truncated
    pub fn to_frame(&self, fps: f64) -> u64 {
        (self.seconds * effective_fps(fps)) as u64
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(DomainError::BadArgs(format!(
                    "Time cannot be negative: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let (hours, minutes, seconds) = match parts.as_slice() {
            [m, s] => (0, parse_component(m, "minutes")?, parse_seconds(s)?),
            [h, m, s] => {
                let minutes = parse_component(m, "minutes")?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs(
                        "Minutes must be less than 60".to_string(),
                    ));
                }
                (parse_component(h, "hours")?, minutes, parse_seconds(s)?)
            }
            _ => {
                return Err(DomainError::BadArgs(format!(
                    "Invalid time format '{}'. Supported formats: seconds (e.g., 12.5), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                    trimmed
                )))
            }
        };

        Ok(Self::from_seconds(
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
        ))
    }

    /// Format as HH:MM:SS.ms
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

fn parse_component(part: &str, name: &str) -> Result<u32, DomainError> {
    part.parse::<u32>()
        .map_err(|_| DomainError::BadArgs(format!("Invalid {} format: {}", name, part)))
}

fn parse_seconds(part: &str) -> Result<f64, DomainError> {
    let seconds = part
        .parse::<f64>()
        .map_err(|_| DomainError::BadArgs(format!("Invalid seconds format: {}", part)))?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(DomainError::BadArgs(
            "Seconds must be less than 60".to_string(),
        ));
    }
    Ok(seconds)
}

/// Frame rate to use for arithmetic, substituting the fallback for unusable values
pub fn effective_fps(fps: f64) -> f64 {
    if fps > 0.0 && fps.is_finite() {
        fps
    } else {
        FALLBACK_FPS
    }
}

/// Format a frame index as HH:MM:SS
pub fn frame_to_time(frame: u64, fps: f64) -> String {
    let total = (frame as f64 / effective_fps(fps)) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Basic properties of a video file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
    /// Duration in seconds
    pub duration: f64,
}

impl VideoInfo {
    /// Build info, falling back to 30 fps and deriving the duration from the frame count
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        let fps = effective_fps(fps);
        Self {
            path: path.into(),
            width,
            height,
            fps,
            total_frames,
            duration: total_frames as f64 / fps,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Width over height
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn last_frame(&self) -> u64 {
        self.total_frames.saturating_sub(1)
    }

    /// One-line summary: name, size, rate, duration, frames
    pub fn summary(&self) -> String {
        format!(
            "{} | {}x{} | {:.2} fps | {} | {} frames",
            self.file_name(),
            self.width,
            self.height,
            self.fps,
            frame_to_time(self.total_frames, self.fps),
            self.total_frames
        )
    }
}

/// Decoded frame in packed BGR24, row-major with no padding
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl VideoFrame {
    pub const CHANNELS: usize = 3;

    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> Result<Self, DomainError> {
        let expected = width as usize * height as usize * Self::CHANNELS;
        if data.len() != expected {
            return Err(DomainError::InvalidFormat(format!(
                "Frame buffer holds {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            index,
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single BGR color
    pub fn filled(index: u64, width: u32, height: u32, bgr: [u8; 3]) -> Self {
        let data = bgr
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::CHANNELS)
            .collect();
        Self {
            index,
            width,
            height,
            data,
        }
    }

    pub fn stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * Self::CHANNELS;
        Some([self.data[offset], self.data[offset + 1], self.data[offset + 2]])
    }

    /// Copy out a sub-rectangle; the rectangle must lie inside the frame
    pub fn crop(&self, rect: &PixelRect) -> Result<Self, DomainError> {
        if rect.width == 0
            || rect.height == 0
            || rect.x + rect.width > self.width
            || rect.y + rect.height > self.height
        {
            return Err(DomainError::BadArgs(format!(
                "Crop {} does not fit in {}x{} frame",
                rect, self.width, self.height
            )));
        }

        let row_len = rect.width as usize * Self::CHANNELS;
        let mut data = Vec::with_capacity(row_len * rect.height as usize);
        for row in rect.y..rect.y + rect.height {
            let start = row as usize * self.stride() + rect.x as usize * Self::CHANNELS;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Ok(Self {
            index: self.index,
            width: rect.width,
            height: rect.height,
            data,
        })
    }
}

/// Integer rectangle in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Axis-aligned box in pixel coordinates (corners)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// From top-left corner and size
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    /// From center and size
    pub fn from_cxcywh(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Clamp into a width x height image
    pub fn clip(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }
}

/// Person detection produced by the detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: BBox, confidence: f32) -> Self {
        Self { bbox, confidence }
    }
}

/// Where a track position came from in the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMethod {
    Yolo,
    Tracker,
}

impl fmt::Display for TrackMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackMethod::Yolo => write!(f, "yolo"),
            TrackMethod::Tracker => write!(f, "tracker"),
        }
    }
}

/// One active track in a processed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    pub id: u32,
    pub bbox: BBox,
    pub confidence: f32,
    pub method: TrackMethod,
}

/// Correlation-filter tracker implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    /// Accurate, slower
    #[default]
    Csrt,
    /// Balanced
    Kcf,
    /// Fastest, least accurate
    Mosse,
}

impl TrackerKind {
    pub fn all() -> [TrackerKind; 3] {
        [TrackerKind::Csrt, TrackerKind::Kcf, TrackerKind::Mosse]
    }

    pub fn description(&self) -> &'static str {
        match self {
            TrackerKind::Csrt => "CSRT (accurate)",
            TrackerKind::Kcf => "KCF (balanced)",
            TrackerKind::Mosse => "MOSSE (fast)",
        }
    }
}

impl FromStr for TrackerKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csrt" => Ok(TrackerKind::Csrt),
            "kcf" => Ok(TrackerKind::Kcf),
            "mosse" => Ok(TrackerKind::Mosse),
            other => Err(DomainError::BadArgs(format!(
                "Unknown tracker '{}'. Expected csrt, kcf or mosse",
                other
            ))),
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerKind::Csrt => write!(f, "CSRT"),
            TrackerKind::Kcf => write!(f, "KCF"),
            TrackerKind::Mosse => write!(f, "MOSSE"),
        }
    }
}

/// Crop aspect ratio presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "3:4")]
    ThreeFour,
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "9:16")]
    NineSixteen,
}

impl AspectRatio {
    pub fn all() -> [AspectRatio; 6] {
        [
            AspectRatio::Free,
            AspectRatio::Square,
            AspectRatio::FourThree,
            AspectRatio::ThreeFour,
            AspectRatio::SixteenNine,
            AspectRatio::NineSixteen,
        ]
    }

    /// Width over height, `None` for free-form
    pub fn ratio(&self) -> Option<f64> {
        match self {
            AspectRatio::Free => None,
            AspectRatio::Square => Some(1.0),
            AspectRatio::FourThree => Some(4.0 / 3.0),
            AspectRatio::ThreeFour => Some(3.0 / 4.0),
            AspectRatio::SixteenNine => Some(16.0 / 9.0),
            AspectRatio::NineSixteen => Some(9.0 / 16.0),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::all()
            .into_iter()
            .find(|ratio| ratio.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::BadArgs(format!(
                    "Unknown aspect ratio '{}'. Expected free, 1:1, 4:3, 3:4, 16:9 or 9:16",
                    s
                ))
            })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AspectRatio::Free => "free",
            AspectRatio::Square => "1:1",
            AspectRatio::FourThree => "4:3",
            AspectRatio::ThreeFour => "3:4",
            AspectRatio::SixteenNine => "16:9",
            AspectRatio::NineSixteen => "9:16",
        };
        write!(f, "{}", label)
    }
}

/// Crop rectangle in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Default for CropRegion {
    fn default() -> Self {
        Self::full()
    }
}

impl CropRegion {
    /// Smallest side length as a fraction of the frame
    pub const MIN_SIZE: f64 = 0.05;

    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Result<Self, DomainError> {
        let region = Self { x, y, w, h };
        region.validate()?;
        Ok(region)
    }

    pub fn full() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        }
    }

    pub fn is_full(&self) -> bool {
        self.x <= f64::EPSILON
            && self.y <= f64::EPSILON
            && self.w >= 1.0 - f64::EPSILON
            && self.h >= 1.0 - f64::EPSILON
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        const EPS: f64 = 1e-9;
        let values = [self.x, self.y, self.w, self.h];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DomainError::BadArgs("Crop values must be finite".to_string()));
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Err(DomainError::BadArgs("Crop origin must be non-negative".to_string()));
        }
        if self.w < Self::MIN_SIZE - EPS || self.h < Self::MIN_SIZE - EPS {
            return Err(DomainError::BadArgs(format!(
                "Crop sides must be at least {}",
                Self::MIN_SIZE
            )));
        }
        if self.x + self.w > 1.0 + EPS || self.y + self.h > 1.0 + EPS {
            return Err(DomainError::BadArgs("Crop must lie inside the frame".to_string()));
        }
        Ok(())
    }

    /// Pixel rectangle for a frame; sides are even and at least 2, so the
    /// frame itself must be at least 2x2
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> Result<PixelRect, DomainError> {
        if frame_width < 2 || frame_height < 2 {
            return Err(DomainError::InvalidFormat(format!(
                "{}x{} frames are too small to crop",
                frame_width, frame_height
            )));
        }
        let x = ((self.x * frame_width as f64) as u32).min(frame_width.saturating_sub(2));
        let y = ((self.y * frame_height as f64) as u32).min(frame_height.saturating_sub(2));
        let width = even_at_least_two((self.w * frame_width as f64) as u32)
            .min(even_floor(frame_width - x));
        let height = even_at_least_two((self.h * frame_height as f64) as u32)
            .min(even_floor(frame_height - y));
        Ok(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

fn even_floor(value: u32) -> u32 {
    value - value % 2
}

fn even_at_least_two(value: u32) -> u32 {
    even_floor(value).max(2)
}

impl FromStr for CropRegion {
    type Err = DomainError;

    /// Parse `x,y,w,h` in normalized coordinates
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| DomainError::BadArgs(format!("Invalid crop value: {}", part)))
            })
            .collect::<Result<Vec<f64>, DomainError>>()?;

        match values.as_slice() {
            [x, y, w, h] => CropRegion::new(*x, *y, *w, *h),
            _ => Err(DomainError::BadArgs(format!(
                "Crop must be x,y,w,h in normalized coordinates, got '{}'",
                s
            ))),
        }
    }
}

/// Video file listed in a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<chrono::DateTime<chrono::Local>>,
}

impl VideoEntry {
    pub fn from_path(path: &Path, size: u64, modified: Option<chrono::DateTime<chrono::Local>>) -> Self {
        Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size,
            modified,
        }
    }
}
