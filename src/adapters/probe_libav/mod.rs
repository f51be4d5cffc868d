// Probe LibAV adapter - Media file analysis using libav

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::VideoInfo;
use crate::error::TrimTrackError;
use crate::ports::ProbePort;

/// LibAV-based media probing adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn to_domain(error: TrimTrackError) -> DomainError {
    match error {
        TrimTrackError::InputFileNotFound { path } => DomainError::FileNotFound(path),
        TrimTrackError::Domain(inner) => inner,
        other => DomainError::InvalidFormat(other.to_string()),
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe(&self, path: &Path) -> Result<VideoInfo, DomainError> {
        let owned = path.to_path_buf();
        // libav opens and parses the container synchronously
        let info = tokio::task::spawn_blocking(move || crate::media::probe(&owned))
            .await
            .map_err(|e| DomainError::InternalError(format!("Probe task failed: {}", e)))?
            .map_err(to_domain)?;

        debug!(path = %path.display(), summary = %info.summary(), "Probed video");
        Ok(info)
    }
}
