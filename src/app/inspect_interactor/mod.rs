// Inspect interactor - Orchestrates the video inspection use case

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::{frame_to_time, VideoInfo};
use crate::ports::ProbePort;

/// Request to inspect one video
#[derive(Debug, Clone)]
pub struct InspectRequest {
    pub input: PathBuf,
}

impl InspectRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self { input: input.into() }
    }
}

/// Probed properties plus the one-line summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectResponse {
    pub info: VideoInfo,
    pub summary: String,
}

impl InspectResponse {
    pub fn format_as_json(&self) -> Result<String, DomainError> {
        serde_json::to_string_pretty(&self.info)
            .map_err(|e| DomainError::InternalError(format!("JSON serialization failed: {}", e)))
    }

    pub fn format_as_text(&self) -> String {
        let info = &self.info;
        let mut text = String::new();
        text.push_str(&format!("File:       {}\n", info.path.display()));
        text.push_str(&format!("Resolution: {}x{}\n", info.width, info.height));
        text.push_str(&format!("Frame rate: {:.2} fps\n", info.fps));
        text.push_str(&format!(
            "Duration:   {} ({:.2} s)\n",
            frame_to_time(info.total_frames, info.fps),
            info.duration
        ));
        text.push_str(&format!("Frames:     {}\n", info.total_frames));
        text.push_str(&format!("Aspect:     {:.3}\n", info.aspect()));
        text
    }
}

/// Interactor for the inspect use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    pub async fn execute(&self, request: InspectRequest) -> Result<InspectResponse, DomainError> {
        let info = self.probe_port.probe(&request.input).await?;
        info!(
            input = %request.input.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            frames = info.total_frames,
            "Video inspected"
        );
        let summary = info.summary();
        Ok(InspectResponse { info, summary })
    }
}
