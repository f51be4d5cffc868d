//! Progress tracking, callbacks and cancellation

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared stop flag polled between frames; set from Ctrl-C or a caller
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Progress callback trait for UI integration
pub trait ProgressCallback: Send + Sync {
    /// Called when operation starts
    fn on_start(&self, operation: &str, total_work: Option<u64>);

    /// Called during operation progress
    fn on_progress(&self, completed: u64, total: Option<u64>, message: Option<String>);

    /// Called when operation completes successfully
    fn on_complete(&self, message: Option<String>);

    /// Called when operation fails
    fn on_error(&self, error: &str);

    /// Called when operation is cancelled
    fn on_cancel(&self);

    /// Check if operation should be cancelled
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Progress phases
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    Initializing,
    /// Positioning the decoder on the first frame
    Seeking,
    Processing,
    /// Flushing the encoder and closing the file
    Finalizing,
    Complete,
    Failed,
    Cancelled,
}

/// Detailed progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub phase: ProgressPhase,
    /// Progress percentage (0.0 - 100.0)
    pub percent: f64,
    pub completed: u64,
    pub total: Option<u64>,
    pub message: String,
    pub elapsed: Duration,
    pub eta: Option<Duration>,
    /// Work units per second
    pub throughput: Option<f64>,
}

struct ProgressTrackerInner {
    info: ProgressInfo,
    start_time: Instant,
    last_update: Option<Instant>,
    update_interval: Duration,
}

/// Progress tracker with thread-safe updates
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressTrackerInner>>,
    callbacks: Arc<Mutex<Vec<Arc<dyn ProgressCallback>>>>,
    cancel: CancelFlag,
}

impl ProgressTracker {
    pub fn new(operation: &str) -> Self {
        Self::with_cancel_flag(operation, CancelFlag::new())
    }

    /// Tracker that reports cancellation whenever `cancel` is set
    pub fn with_cancel_flag(operation: &str, cancel: CancelFlag) -> Self {
        let info = ProgressInfo {
            phase: ProgressPhase::Initializing,
            percent: 0.0,
            completed: 0,
            total: None,
            message: operation.to_string(),
            elapsed: Duration::ZERO,
            eta: None,
            throughput: None,
        };

        let inner = ProgressTrackerInner {
            info,
            start_time: Instant::now(),
            last_update: None,
            // Update at most 10 times per second
            update_interval: Duration::from_millis(100),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            cancel,
        }
    }

    pub fn add_callback(&self, callback: Arc<dyn ProgressCallback>) {
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.push(callback);
        }
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Start operation with optional total work estimation
    pub fn start(&self, operation: &str, total_work: Option<u64>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.info.phase = ProgressPhase::Initializing;
            inner.info.message = operation.to_string();
            inner.info.total = total_work;
            inner.info.completed = 0;
            inner.info.percent = 0.0;
            inner.start_time = Instant::now();
            inner.last_update = None;
        }

        self.notify_callbacks(|cb| cb.on_start(operation, total_work));
    }

    /// Update progress; callbacks are throttled except for the first and last unit
    pub fn update(&self, completed: u64, message: Option<String>) {
        let total = {
            let Ok(mut inner) = self.inner.lock() else {
                return;
            };
            let now = Instant::now();
            let finished = inner.info.total.is_some_and(|total| completed >= total);
            let due = inner
                .last_update
                .map_or(true, |last| now.duration_since(last) >= inner.update_interval);

            inner.info.completed = completed;
            inner.info.elapsed = now.duration_since(inner.start_time);
            if let Some(ref msg) = message {
                inner.info.message = msg.clone();
            }

            let seconds = inner.info.elapsed.as_secs_f64();
            if seconds > 0.0 {
                inner.info.throughput = Some(completed as f64 / seconds);
            }
            if let Some(total) = inner.info.total.filter(|t| *t > 0) {
                inner.info.percent = (completed as f64 / total as f64 * 100.0).min(100.0);
                inner.info.eta = match inner.info.throughput {
                    Some(rate) if rate > 0.0 && completed < total => {
                        Some(Duration::from_secs_f64((total - completed) as f64 / rate))
                    }
                    _ => None,
                };
            }

            if !due && !finished {
                return;
            }
            inner.last_update = Some(now);
            inner.info.total
        };

        self.notify_callbacks(|cb| cb.on_progress(completed, total, message.clone()));
    }

    pub fn set_phase(&self, phase: ProgressPhase, message: Option<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.info.phase = phase;
            if let Some(msg) = message {
                inner.info.message = msg;
            }
        }
    }

    /// Complete operation successfully
    pub fn complete(&self, message: Option<String>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.info.phase = ProgressPhase::Complete;
            inner.info.percent = 100.0;
            inner.info.eta = None;
            if let Some(ref msg) = message {
                inner.info.message = msg.clone();
            }
        }

        self.notify_callbacks(|cb| cb.on_complete(message.clone()));
    }

    /// Mark operation as failed
    pub fn error(&self, error: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.info.phase = ProgressPhase::Failed;
            inner.info.message = error.to_string();
        }

        self.notify_callbacks(|cb| cb.on_error(error));
    }

    /// Cancel operation
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.mark_cancelled();
    }

    /// Record that the operation stopped because of a cancel request
    pub fn mark_cancelled(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.info.phase = ProgressPhase::Cancelled;
            inner.info.message = "Operation cancelled".to_string();
        }

        self.notify_callbacks(|cb| cb.on_cancel());
    }

    /// Check if operation should be cancelled
    pub fn is_cancelled(&self) -> bool {
        if self.cancel.is_cancelled() {
            return true;
        }

        if let Ok(callbacks) = self.callbacks.lock() {
            if callbacks.iter().any(|callback| callback.should_cancel()) {
                return true;
            }
        }

        false
    }

    pub fn get_info(&self) -> Option<ProgressInfo> {
        self.inner.lock().ok().map(|inner| inner.info.clone())
    }

    pub fn set_update_interval(&self, interval: Duration) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.update_interval = interval;
        }
    }

    fn notify_callbacks<F>(&self, f: F)
    where
        F: Fn(&dyn ProgressCallback),
    {
        if let Ok(callbacks) = self.callbacks.lock() {
            for callback in callbacks.iter() {
                f(callback.as_ref());
            }
        }
    }
}

/// Single-line progress bar on stderr
pub struct ConsoleProgressCallback {
    verbose: bool,
}

impl ConsoleProgressCallback {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_start(&self, operation: &str, total_work: Option<u64>) {
        if self.verbose {
            match total_work {
                Some(total) => eprintln!("{} ({} frames)", operation, total),
                None => eprintln!("{}", operation),
            }
        }
    }

    fn on_progress(&self, completed: u64, total: Option<u64>, message: Option<String>) {
        let mut stderr = std::io::stderr();
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = (completed as f64 / total as f64 * 100.0).min(100.0);
            let bar_length = 20;
            let filled = (percent / 100.0 * bar_length as f64) as usize;
            let bar = "#".repeat(filled) + &"-".repeat(bar_length - filled);
            let _ = write!(
                stderr,
                "\r[{}] {:>5.1}% {}",
                bar,
                percent,
                message.unwrap_or_default()
            );
        } else {
            let _ = write!(stderr, "\r{} frames {}", completed, message.unwrap_or_default());
        }
        let _ = stderr.flush();
    }

    fn on_complete(&self, message: Option<String>) {
        eprintln!();
        if let Some(msg) = message {
            eprintln!("Completed: {}", msg);
        }
    }

    fn on_error(&self, error: &str) {
        eprintln!();
        eprintln!("Error: {}", error);
    }

    fn on_cancel(&self) {
        eprintln!();
        eprintln!("Operation cancelled");
    }
}
