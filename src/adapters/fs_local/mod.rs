// Local filesystem adapter - Video listing and file manager integration

use std::cmp::Reverse;
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus};
use std::thread::JoinHandle;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::errors::DomainError;
use crate::domain::model::VideoEntry;
use crate::ports::FsPort;
use crate::utils::path::PathUtils;

/// Filesystem adapter over `std::fs` and `walkdir`
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Start `program` without blocking; a background thread reaps it
    fn launch_detached(program: &str, args: &[String]) -> Result<JoinHandle<Option<ExitStatus>>, DomainError> {
        let mut child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|e| DomainError::FileSystem(format!("Failed to launch {}: {}", program, e)))?;
        let program = program.to_string();
        Ok(std::thread::spawn(move || match child.wait() {
            Ok(status) => {
                debug!(program = %program, %status, "File manager exited");
                Some(status)
            }
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to wait for file manager");
                None
            }
        }))
    }

    /// Video files directly inside `folder`, in directory order
    fn scan(folder: &Path) -> Result<Vec<VideoEntry>, DomainError> {
        if !folder.is_dir() {
            return Err(DomainError::FileNotFound(format!(
                "Folder does not exist: {}",
                folder.display()
            )));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !PathUtils::is_video_file(entry.path()) {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| {
                DomainError::FileSystem(format!(
                    "Failed to read metadata of {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;
            let modified = metadata.modified().ok().map(DateTime::<Local>::from);
            entries.push(VideoEntry::from_path(entry.path(), metadata.len(), modified));
        }
        Ok(entries)
    }
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn list_videos(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError> {
        let mut entries = Self::scan(folder)?;
        entries.sort_by_key(|entry| entry.name.to_lowercase());
        debug!(folder = %folder.display(), count = entries.len(), "Listed videos");
        Ok(entries)
    }

    async fn list_recent(&self, folder: &Path) -> Result<Vec<VideoEntry>, DomainError> {
        // A missing output folder just means nothing was exported yet
        if !folder.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Self::scan(folder)?;
        entries.sort_by_key(|entry| Reverse(entry.modified));
        Ok(entries)
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), DomainError> {
        fs::create_dir_all(path).map_err(|e| {
            DomainError::FileSystem(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })
    }

    async fn remove_file(&self, path: &Path) -> Result<(), DomainError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::FileSystem(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn reveal(&self, path: &Path) -> Result<(), DomainError> {
        if !path.exists() {
            return Err(DomainError::FileNotFound(path.display().to_string()));
        }
        let (program, args) = PathUtils::reveal_command(path);
        debug!(program = %program, ?args, "Revealing file");
        Self::launch_detached(&program, &args)?;
        Ok(())
    }
}
