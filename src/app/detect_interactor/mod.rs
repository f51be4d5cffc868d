// Detect interactor - Person detection on a single image

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::model::Detection;
use crate::domain::rules::{detected_output_path, largest_detection};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::media::still::{load_frame, save_frame};
use crate::ports::{DetectorLoader, FrameAnnotator};

#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub image: PathBuf,
    /// Defaults to `<stem>_detected<ext>` next to the image
    pub output: Option<PathBuf>,
}

/// Detections found in an image and where the annotated copy went
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    pub image: PathBuf,
    pub output: PathBuf,
    pub detections: Vec<Detection>,
    pub largest: Option<Detection>,
}

pub struct DetectInteractor {
    detectors: Arc<dyn DetectorLoader>,
    annotator: Arc<dyn FrameAnnotator>,
}

impl DetectInteractor {
    pub fn new(detectors: Arc<dyn DetectorLoader>, annotator: Arc<dyn FrameAnnotator>) -> Self {
        Self { detectors, annotator }
    }

    pub async fn execute(&self, options: DetectOptions) -> TrimTrackResult<DetectReport> {
        if !options.image.is_file() {
            return Err(TrimTrackError::InputFileNotFound {
                path: options.image.display().to_string(),
            });
        }
        let output = options
            .output
            .clone()
            .unwrap_or_else(|| detected_output_path(&options.image));
        let detectors = Arc::clone(&self.detectors);
        let annotator = Arc::clone(&self.annotator);
        let image = options.image;

        tokio::task::spawn_blocking(move || -> TrimTrackResult<DetectReport> {
            let mut detector = detectors.load()?;
            let mut frame = load_frame(&image)?;
            let detections = detector.detect(&frame)?;
            annotator.annotate_detections(&mut frame, &detections)?;
            save_frame(&frame, &output)?;

            info!(
                image = %image.display(),
                output = %output.display(),
                persons = detections.len(),
                "Detection finished"
            );
            let largest = largest_detection(&detections);
            Ok(DetectReport {
                image,
                output,
                detections,
                largest,
            })
        })
        .await
        .map_err(|e| TrimTrackError::InferenceError {
            message: format!("Detection task failed: {}", e),
        })?
    }
}
