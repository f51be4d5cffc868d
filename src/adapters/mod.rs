// Adapters - External system implementations

pub mod fs_local;
pub mod model_fetch;
pub mod onnx_detector;
pub mod opencv;
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use fs_local::FsLocalAdapter;
pub use model_fetch::UreqModelFetcher;
pub use onnx_detector::{DetectorSettings, OnnxDetectorLoader, OnnxPersonDetector};
pub use opencv::{OpenCvAnnotator, OpenCvTrackerFactory};
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::TomlConfigAdapter;
