// Model fetch adapter - Downloads the detector model over HTTPS

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::ModelFetchPort;

/// Mirrors of `yolov8n.onnx`, tried in order
pub const MODEL_URLS: [&str; 3] = [
    "https://huggingface.co/Kalray/yolov8/resolve/main/yolov8n.onnx",
    "https://huggingface.co/SpotLab/YOLOv8Detection/resolve/3005c6751fb19cdeb6b10c066185908faf66a097/yolov8n.onnx",
    "https://huggingface.co/unity/inference-engine-yolo/resolve/ed7f4daf9263d0d31be1d60b9d67c8baea721d60/yolov8n.onnx",
];

/// Reader that logs download progress every 10 percent
struct ProgressReader<R> {
    inner: R,
    read: u64,
    total: Option<u64>,
    last_decile: u64,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if let Some(total) = self.total.filter(|t| *t > 0) {
            let decile = self.read * 10 / total;
            if decile > self.last_decile {
                self.last_decile = decile;
                info!(percent = decile * 10, bytes = self.read, "Downloading model");
            }
        }
        Ok(n)
    }
}

/// Blocking HTTP downloader backed by `ureq`
pub struct UreqModelFetcher {
    urls: Vec<String>,
    timeout: Duration,
}

impl Default for UreqModelFetcher {
    fn default() -> Self {
        Self::new(MODEL_URLS.iter().map(|url| url.to_string()).collect())
    }
}

impl UreqModelFetcher {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    fn partial_path(dest: &Path) -> PathBuf {
        let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".part");
        dest.with_file_name(name)
    }

    fn download(&self, url: &str, dest: &Path) -> TrimTrackResult<u64> {
        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .map_err(|e| TrimTrackError::DownloadError {
                message: format!("{}: {}", url, e),
            })?;
        let total = response
            .header("Content-Length")
            .and_then(|value| value.parse::<u64>().ok());

        let partial = Self::partial_path(dest);
        let result = (|| -> TrimTrackResult<u64> {
            let mut reader = ProgressReader {
                inner: response.into_reader(),
                read: 0,
                total,
                last_decile: 0,
            };
            let mut writer = BufWriter::new(File::create(&partial)?);
            let written = io::copy(&mut reader, &mut writer)?;
            writer.flush()?;
            if written == 0 {
                return Err(TrimTrackError::DownloadError {
                    message: format!("{} returned an empty body", url),
                });
            }
            fs::rename(&partial, dest)?;
            Ok(written)
        })();

        if result.is_err() && partial.exists() {
            let _ = fs::remove_file(&partial);
        }
        result
    }
}

impl ModelFetchPort for UreqModelFetcher {
    fn fetch(&self, dest: &Path) -> TrimTrackResult<String> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut failures = Vec::new();
        for url in &self.urls {
            info!(url = %url, dest = %dest.display(), "Trying model mirror");
            match self.download(url, dest) {
                Ok(bytes) => {
                    info!(url = %url, bytes, "Model downloaded");
                    return Ok(url.clone());
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Mirror failed");
                    failures.push(e.to_string());
                }
            }
        }

        Err(TrimTrackError::DownloadError {
            message: format!(
                "All {} sources failed ({}). Download yolov8n.onnx manually from {} into {}",
                self.urls.len(),
                failures.join("; "),
                crate::adapters::onnx_detector::MODEL_RELEASES_URL,
                dest.display()
            ),
        })
    }
}
