// Cut interactor - Plans a clip selection and runs the export off the async runtime

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::info;

use crate::domain::crop::CropEditor;
use crate::domain::errors::DomainError;
use crate::domain::model::{frame_to_time, AspectRatio, CropRegion, TimeSpec, VideoInfo};
use crate::domain::rules::clip_file_name;
use crate::domain::timeline::Timeline;
use crate::engine::{ClipCutter, CutOutcome, CutRequest, ProgressTracker};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{FsPort, ProbePort, SinkFactory, SourceFactory};
use crate::utils::path::PathUtils;

/// What to export from one video
#[derive(Debug, Clone)]
pub struct CutOptions {
    pub input: PathBuf,
    pub start: Option<TimeSpec>,
    pub end: Option<TimeSpec>,
    /// Seconds from the start; exclusive with `end`
    pub duration: Option<f64>,
    pub crop: Option<CropRegion>,
    pub aspect: AspectRatio,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl CutOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            start: None,
            end: None,
            duration: None,
            crop: None,
            aspect: AspectRatio::Free,
            output: None,
            output_dir: None,
        }
    }
}

/// Frame range `[start_frame, end_frame)` and crop picked for an export
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSelection {
    pub start_frame: u64,
    pub end_frame: u64,
    pub crop: CropRegion,
}

impl CutSelection {
    pub fn frame_count(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

/// Resolve times, duration, crop and aspect against the video, the way the editor would
pub fn plan_selection(info: &VideoInfo, options: &CutOptions) -> Result<CutSelection, DomainError> {
    let mut timeline = Timeline::for_frames(info.total_frames);
    if timeline.max() == 0 {
        return Err(DomainError::InvalidTimeRange(format!(
            "{} has too few frames to cut",
            info.file_name()
        )));
    }

    if let Some(start) = options.start {
        let frame = start.to_frame(info.fps);
        if frame >= timeline.max() {
            return Err(DomainError::InvalidTimeRange(format!(
                "Start {} is at or past the last frame ({})",
                start,
                frame_to_time(timeline.max(), info.fps)
            )));
        }
        timeline.set_start(frame);
    }

    match (options.end, options.duration) {
        (Some(_), Some(_)) => {
            return Err(DomainError::BadArgs(
                "End time and duration cannot be combined".to_string(),
            ));
        }
        (Some(end), None) => {
            let frame = end.to_frame(info.fps);
            if frame <= timeline.start() {
                return Err(DomainError::InvalidTimeRange(format!(
                    "End {} must be after start {}",
                    end,
                    frame_to_time(timeline.start(), info.fps)
                )));
            }
            timeline.set_end(frame);
        }
        (None, Some(seconds)) => timeline.set_duration(seconds, info.fps, info.total_frames)?,
        (None, None) => {}
    }

    let mut editor = CropEditor::new();
    editor.set_video_size(info.width, info.height);
    if let Some(crop) = options.crop {
        crop.validate()?;
        editor.set_crop(crop.x, crop.y, crop.w, crop.h, None);
    }
    editor.set_aspect(options.aspect);

    Ok(CutSelection {
        start_frame: timeline.start(),
        end_frame: timeline.end(),
        crop: editor.crop(),
    })
}

/// Interactor for the clip export use case
pub struct CutInteractor {
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    sources: Arc<dyn SourceFactory>,
    sinks: Arc<dyn SinkFactory>,
    generated_dir_name: String,
}

impl CutInteractor {
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        fs_port: Arc<dyn FsPort>,
        sources: Arc<dyn SourceFactory>,
        sinks: Arc<dyn SinkFactory>,
        generated_dir_name: impl Into<String>,
    ) -> Self {
        Self {
            probe_port,
            fs_port,
            sources,
            sinks,
            generated_dir_name: generated_dir_name.into(),
        }
    }

    /// Explicit output, else a timestamped name in the output folder
    pub fn output_path(
        &self,
        info: &VideoInfo,
        options: &CutOptions,
        selection: &CutSelection,
    ) -> PathBuf {
        if let Some(output) = &options.output {
            return output.clone();
        }
        let dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| PathUtils::parent_dir(&info.path).join(&self.generated_dir_name));
        dir.join(clip_file_name(&Local::now(), selection.frame_count(), info.fps))
    }

    pub async fn execute(
        &self,
        options: CutOptions,
        progress: ProgressTracker,
    ) -> TrimTrackResult<CutOutcome> {
        let info = self.probe_port.probe(&options.input).await?;
        let selection = plan_selection(&info, &options)?;
        let output = self.output_path(&info, &options, &selection);
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs_port.ensure_dir(parent).await?;
        }

        info!(
            input = %info.path.display(),
            start = %frame_to_time(selection.start_frame, info.fps),
            end = %frame_to_time(selection.end_frame, info.fps),
            aspect = %options.aspect,
            "Clip planned"
        );

        let request = CutRequest {
            start_frame: selection.start_frame,
            end_frame: selection.end_frame,
            crop: selection.crop,
            output,
        };
        let sources = Arc::clone(&self.sources);
        let sinks = Arc::clone(&self.sinks);
        let input = options.input;

        tokio::task::spawn_blocking(move || {
            let mut source = sources.open(&input)?;
            ClipCutter::new(sinks.as_ref()).cut(source.as_mut(), &request, &progress)
        })
        .await
        .map_err(|e| TrimTrackError::OutputError {
            message: format!("Export task failed: {}", e),
        })?
    }
}

#[cfg(test)]
mod tests;
