// Library interactor - Source videos and generated clips in a folder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::VideoEntry;
use crate::ports::FsPort;

/// Interactor for browsing a video folder
pub struct LibraryInteractor {
    fs_port: Arc<dyn FsPort>,
    generated_dir_name: String,
}

impl LibraryInteractor {
    pub fn new(fs_port: Arc<dyn FsPort>, generated_dir_name: impl Into<String>) -> Self {
        Self {
            fs_port,
            generated_dir_name: generated_dir_name.into(),
        }
    }

    /// Folder receiving clips exported from `folder`
    pub fn generated_dir(&self, folder: &Path) -> PathBuf {
        folder.join(&self.generated_dir_name)
    }

    /// Source videos, sorted by name
    pub async fn list_sources(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError> {
        let entries = self.fs_port.list_videos(folder).await?;
        info!(folder = %folder.display(), count = entries.len(), "Listed source videos");
        Ok(entries)
    }

    /// Exported clips, newest first; empty before the first export
    pub async fn list_generated(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError> {
        let dir = self.generated_dir(folder);
        let entries = self.fs_port.list_recent(&dir).await?;
        debug!(folder = %dir.display(), count = entries.len(), "Listed generated clips");
        Ok(entries)
    }

    /// Show a clip or source in the platform file manager
    pub fn reveal(&self, path: &Path) -> Result<(), DomainError> {
        info!(path = %path.display(), "Revealing file");
        self.fs_port.reveal(path)
    }
}
