// Preview interactor - Renders editor frames to images

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::app::editor::ClipEditor;
use crate::domain::model::{TimeSpec, VideoFrame};
use crate::domain::timeline::PlaybackMode;
use crate::engine::CancelFlag;
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::media::still::save_frame;
use crate::ports::{FsPort, SourceFactory};

/// Single frame (`at` without `play`) or a playback run
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub input: PathBuf,
    pub at: Option<TimeSpec>,
    pub play: bool,
    /// Play the selected range instead of running to the last frame
    pub range: bool,
    pub start: Option<TimeSpec>,
    pub end: Option<TimeSpec>,
    pub speed: f64,
    /// Playback ticks to render
    pub max_frames: usize,
    pub out_dir: PathBuf,
}

impl PreviewOptions {
    pub fn new(input: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            at: None,
            play: false,
            range: false,
            start: None,
            end: None,
            speed: 1.0,
            max_frames: 30,
            out_dir: out_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub frames: Vec<PathBuf>,
    /// Range label as the editor shows it
    pub selection: String,
    pub frame_skip: u32,
}

pub struct PreviewInteractor {
    fs_port: Arc<dyn FsPort>,
    sources: Arc<dyn SourceFactory>,
}

impl PreviewInteractor {
    pub fn new(fs_port: Arc<dyn FsPort>, sources: Arc<dyn SourceFactory>) -> Self {
        Self { fs_port, sources }
    }

    pub async fn execute(
        &self,
        options: PreviewOptions,
        cancel: CancelFlag,
    ) -> TrimTrackResult<PreviewReport> {
        self.fs_port.ensure_dir(&options.out_dir).await?;
        let sources = Arc::clone(&self.sources);

        tokio::task::spawn_blocking(move || {
            let source = sources.open(&options.input)?;
            let editor = ClipEditor::new(source);
            Self::render(editor, &options, &cancel)
        })
        .await
        .map_err(|e| TrimTrackError::DecodeError {
            message: format!("Preview task failed: {}", e),
        })?
    }

    /// Drive the editor headlessly and write every displayed frame
    pub fn render(
        mut editor: ClipEditor,
        options: &PreviewOptions,
        cancel: &CancelFlag,
    ) -> TrimTrackResult<PreviewReport> {
        let fps = editor.info().fps;
        if let Some(end) = options.end {
            editor.timeline_mut().set_end(end.to_frame(fps));
        }
        if let Some(start) = options.start {
            editor.timeline_mut().set_start(start.to_frame(fps));
        }
        let first = options
            .at
            .map(|at| at.to_frame(fps))
            .unwrap_or_else(|| editor.timeline().start());

        let mut frames = Vec::new();
        if !options.play {
            if let Some(frame) = editor.show(first)? {
                frames.push(write_frame(frame, &options.out_dir)?);
            }
        } else {
            editor.set_speed(options.speed)?;
            editor.show(first)?;
            let mode = if options.range {
                PlaybackMode::Range
            } else {
                PlaybackMode::Full
            };
            if let Some(frame) = editor.play(mode)? {
                frames.push(write_frame(frame, &options.out_dir)?);
            }
            while frames.len() < options.max_frames && !cancel.is_cancelled() {
                match editor.tick(None)? {
                    Some(frame) => frames.push(write_frame(frame, &options.out_dir)?),
                    None => break,
                }
            }
            editor.stop();
        }

        info!(
            input = %editor.info().path.display(),
            frames = frames.len(),
            out_dir = %options.out_dir.display(),
            "Preview rendered"
        );
        Ok(PreviewReport {
            frames,
            selection: editor.selection_label(),
            frame_skip: editor.playback().frame_skip(),
        })
    }
}

fn write_frame(frame: &VideoFrame, out_dir: &Path) -> TrimTrackResult<PathBuf> {
    let path = out_dir.join(format!("frame_{:06}.png", frame.index));
    save_frame(frame, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::VideoInfo;
    use crate::ports::FrameSource;

    struct GraySource {
        info: VideoInfo,
        next: u64,
    }

    impl FrameSource for GraySource {
        fn info(&self) -> &VideoInfo {
            &self.info
        }

        fn read(&mut self) -> TrimTrackResult<Option<VideoFrame>> {
            if self.next >= self.info.total_frames {
                return Ok(None);
            }
            let frame = VideoFrame::filled(self.next, 4, 4, [128, 128, 128]);
            self.next += 1;
            Ok(Some(frame))
        }

        fn seek(&mut self, index: u64) -> TrimTrackResult<()> {
            self.next = index;
            Ok(())
        }
    }

    fn editor() -> ClipEditor {
        ClipEditor::new(Box::new(GraySource {
            info: VideoInfo::new("gray.mp4", 4, 4, 10.0, 100),
            next: 0,
        }))
    }

    fn names(report: &PreviewReport) -> Vec<String> {
        report
            .frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_single_frame_at_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PreviewOptions::new("gray.mp4", dir.path());
        options.at = Some(TimeSpec::from_seconds(2.5));

        let report = PreviewInteractor::render(editor(), &options, &CancelFlag::new()).unwrap();
        assert_eq!(names(&report), vec!["frame_000025.png"]);
        assert!(report.frames[0].is_file());
    }

    #[test]
    fn test_range_playback_at_double_speed() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PreviewOptions::new("gray.mp4", dir.path());
        options.play = true;
        options.range = true;
        options.start = Some(TimeSpec::from_seconds(1.0));
        options.end = Some(TimeSpec::from_seconds(2.0));
        options.speed = 2.0;

        let report = PreviewInteractor::render(editor(), &options, &CancelFlag::new()).unwrap();
        assert_eq!(report.frame_skip, 2);
        assert_eq!(
            names(&report),
            vec![
                "frame_000010.png",
                "frame_000012.png",
                "frame_000014.png",
                "frame_000016.png",
                "frame_000018.png",
                "frame_000020.png"
            ]
        );
        assert_eq!(report.selection, "00:00:01 - 00:00:02 (00:00:01, 10 frames)");
    }

    #[test]
    fn test_playback_honours_frame_limit_and_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = PreviewOptions::new("gray.mp4", dir.path());
        options.play = true;
        options.max_frames = 3;
        assert_eq!(
            PreviewInteractor::render(editor(), &options, &CancelFlag::new())
                .unwrap()
                .frames
                .len(),
            3
        );

        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = PreviewInteractor::render(editor(), &options, &cancel).unwrap();
        assert_eq!(report.frames.len(), 1);
    }
}
