//! Command-line argument definitions

use std::path::PathBuf;

use clap::{ArgGroup, Args};

use crate::domain::model::{AspectRatio, CropRegion, TimeSpec, TrackerKind};

fn parse_time(value: &str) -> Result<TimeSpec, String> {
    TimeSpec::parse(value).map_err(|e| e.to_string())
}

fn parse_crop(value: &str) -> Result<CropRegion, String> {
    value.parse::<CropRegion>().map_err(|e| e.to_string())
}

fn parse_aspect(value: &str) -> Result<AspectRatio, String> {
    value.parse::<AspectRatio>().map_err(|e| e.to_string())
}

fn parse_tracker(value: &str) -> Result<TrackerKind, String> {
    value.parse::<TrackerKind>().map_err(|e| e.to_string())
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Folder to list (default: library.folder from the config)
    #[arg(short, long)]
    pub folder: Option<PathBuf>,

    /// List exported clips, newest first, instead of source videos
    #[arg(long)]
    pub generated: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cut command
#[derive(Args, Debug)]
pub struct CutArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = parse_time)]
    pub start: Option<TimeSpec>,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = parse_time, conflicts_with = "duration")]
    pub end: Option<TimeSpec>,

    /// Clip length in seconds from the start
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Crop box as normalized x,y,w,h (e.g. 0.25,0,0.5,1)
    #[arg(long, value_parser = parse_crop)]
    pub crop: Option<CropRegion>,

    /// Aspect ratio preset: free, 1:1, 4:3, 3:4, 16:9, 9:16
    #[arg(long, value_parser = parse_aspect)]
    pub aspect: Option<AspectRatio>,

    /// Output file path (default: generated/<timestamp>_<seconds>s.mp4 next to the input)
    #[arg(short, long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Folder for the generated clip name
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print the export report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the preview command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["at", "play"])))]
pub struct PreviewArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Render the single frame at this time
    #[arg(long, value_parser = parse_time)]
    pub at: Option<TimeSpec>,

    /// Render playback ticks
    #[arg(long)]
    pub play: bool,

    /// Play only the selected range
    #[arg(long, requires = "play")]
    pub range: bool,

    /// Range start
    #[arg(short, long, value_parser = parse_time)]
    pub start: Option<TimeSpec>,

    /// Range end
    #[arg(short, long, value_parser = parse_time)]
    pub end: Option<TimeSpec>,

    /// Playback speed: 0.5, 1, 2 or 4
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Most playback frames to render
    #[arg(long, default_value_t = 30)]
    pub frames: usize,

    /// Folder for the PNG frames
    #[arg(long)]
    pub out_dir: PathBuf,

    /// Print the rendered paths as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the track command
#[derive(Args, Debug)]
pub struct TrackArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: <stem>_tracked<ext> next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tracker: csrt (accurate), kcf (balanced), mosse (fastest)
    #[arg(long, value_parser = parse_tracker)]
    pub tracker: Option<TrackerKind>,

    /// Run the detector every N processed frames (10-120)
    #[arg(long, value_parser = clap::value_parser!(u32).range(10..=120))]
    pub redetect_interval: Option<u32>,

    /// Frames to skip between processed frames (0-5)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=5))]
    pub skip_frames: Option<u32>,

    /// YOLOv8 ONNX model path
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Detection confidence threshold
    #[arg(long)]
    pub conf: Option<f32>,

    /// Print the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Input image path
    #[arg(long)]
    pub image: PathBuf,

    /// Annotated image path (default: <stem>_detected<ext> next to the image)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// YOLOv8 ONNX model path
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Detection confidence threshold
    #[arg(long)]
    pub conf: Option<f32>,

    /// Print the detections as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the fetch-model command
#[derive(Args, Debug)]
pub struct FetchModelArgs {
    /// Where to save the model (default: detector.model_path from the config)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Download even if the file exists
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the reveal command
#[derive(Args, Debug)]
pub struct RevealArgs {
    /// File to show
    pub path: PathBuf,
}
