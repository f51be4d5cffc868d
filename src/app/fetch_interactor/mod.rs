// Fetch interactor - Downloads the detector model when it is missing

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::ModelFetchPort;

#[derive(Debug, Clone)]
pub struct FetchModelOptions {
    pub dest: PathBuf,
    /// Download even when the file is already there
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchModelReport {
    pub path: PathBuf,
    /// Mirror the file came from; `None` when the download was skipped
    pub source: Option<String>,
    pub skipped: bool,
    pub size: u64,
}

pub struct FetchModelInteractor {
    fetcher: Arc<dyn ModelFetchPort>,
}

impl FetchModelInteractor {
    pub fn new(fetcher: Arc<dyn ModelFetchPort>) -> Self {
        Self { fetcher }
    }

    pub async fn execute(&self, options: FetchModelOptions) -> TrimTrackResult<FetchModelReport> {
        if options.dest.is_file() && !options.force {
            let size = std::fs::metadata(&options.dest)?.len();
            info!(path = %options.dest.display(), size, "Model already present, skipping download");
            return Ok(FetchModelReport {
                path: options.dest,
                source: None,
                skipped: true,
                size,
            });
        }

        let fetcher = Arc::clone(&self.fetcher);
        let dest = options.dest;
        tokio::task::spawn_blocking(move || -> TrimTrackResult<FetchModelReport> {
            let source = fetcher.fetch(&dest)?;
            let size = std::fs::metadata(&dest)?.len();
            Ok(FetchModelReport {
                path: dest,
                source: Some(source),
                skipped: false,
                size,
            })
        })
        .await
        .map_err(|e| TrimTrackError::DownloadError {
            message: format!("Download task failed: {}", e),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl ModelFetchPort for CountingFetcher {
        fn fetch(&self, dest: &Path) -> TrimTrackResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::fs::write(dest, b"onnx")?;
            Ok("https://mirror.test/yolov8n.onnx".to_string())
        }
    }

    #[tokio::test]
    async fn test_fetch_skips_existing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("yolov8n.onnx");
        let fetcher = Arc::new(CountingFetcher::default());
        let interactor = FetchModelInteractor::new(Arc::clone(&fetcher) as Arc<dyn ModelFetchPort>);

        let first = interactor
            .execute(FetchModelOptions {
                dest: dest.clone(),
                force: false,
            })
            .await
            .unwrap();
        assert!(!first.skipped);
        assert_eq!(first.size, 4);
        assert_eq!(first.source.as_deref(), Some("https://mirror.test/yolov8n.onnx"));

        let second = interactor
            .execute(FetchModelOptions {
                dest: dest.clone(),
                force: false,
            })
            .await
            .unwrap();
        assert!(second.skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let forced = interactor.execute(FetchModelOptions { dest, force: true }).await.unwrap();
        assert!(!forced.skipped);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
