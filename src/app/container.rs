use std::sync::Arc;

use crate::adapters::{
    DetectorSettings, FsLocalAdapter, OnnxDetectorLoader, OpenCvAnnotator, OpenCvTrackerFactory,
    ProbeLibavAdapter, UreqModelFetcher,
};
use crate::app::{
    cut_interactor::CutInteractor, detect_interactor::DetectInteractor,
    fetch_interactor::FetchModelInteractor, inspect_interactor::InspectInteractor,
    library_interactor::LibraryInteractor, preview_interactor::PreviewInteractor,
    track_interactor::TrackInteractor,
};
use crate::config::AppConfig;
use crate::media::{FfmpegSinkFactory, FfmpegSourceFactory};
use crate::ports::{
    DetectorLoader, FrameAnnotator, FsPort, ModelFetchPort, ProbePort, SinkFactory, SourceFactory,
    TrackerFactory,
};

pub trait AppContainer: Send + Sync {
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
    fn library_interactor(&self) -> Arc<LibraryInteractor>;
    fn cut_interactor(&self) -> Arc<CutInteractor>;
    fn preview_interactor(&self) -> Arc<PreviewInteractor>;
    fn track_interactor(&self) -> Arc<TrackInteractor>;
    fn detect_interactor(&self) -> Arc<DetectInteractor>;
    fn fetch_model_interactor(&self) -> Arc<FetchModelInteractor>;
}

pub struct DefaultAppContainer {
    inspect_interactor: Arc<InspectInteractor>,
    library_interactor: Arc<LibraryInteractor>,
    cut_interactor: Arc<CutInteractor>,
    preview_interactor: Arc<PreviewInteractor>,
    track_interactor: Arc<TrackInteractor>,
    detect_interactor: Arc<DetectInteractor>,
    fetch_model_interactor: Arc<FetchModelInteractor>,
}

/// Detector tuning from the `[detector]` section
pub fn detector_settings(config: &AppConfig) -> DetectorSettings {
    DetectorSettings {
        input_size: config.detector.input_size,
        conf_threshold: config.detector.conf_threshold,
        iou_threshold: config.detector.iou_threshold,
        intra_threads: config.detector_threads(),
    }
}

impl DefaultAppContainer {
    /// Wire the libav, ONNX Runtime and OpenCV adapters
    pub fn new(config: &AppConfig) -> Self {
        let probe_port = Arc::new(ProbeLibavAdapter::new());
        let fs_port = Arc::new(FsLocalAdapter::new());
        let sources = Arc::new(FfmpegSourceFactory);
        let sinks = Arc::new(FfmpegSinkFactory);
        let detectors = Arc::new(OnnxDetectorLoader::new(
            config.detector.model_path.clone(),
            detector_settings(config),
        ));
        let trackers = Arc::new(OpenCvTrackerFactory);
        let annotator = Arc::new(OpenCvAnnotator);
        let fetcher = Arc::new(UreqModelFetcher::default());
        let generated_dir_name = config.library.generated_dir_name.clone();

        let inspect_interactor = Arc::new(InspectInteractor::new(
            Arc::clone(&probe_port) as Arc<dyn ProbePort>,
        ));

        let library_interactor = Arc::new(LibraryInteractor::new(
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            generated_dir_name.clone(),
        ));

        let cut_interactor = Arc::new(CutInteractor::new(
            Arc::clone(&probe_port) as Arc<dyn ProbePort>,
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&sources) as Arc<dyn SourceFactory>,
            Arc::clone(&sinks) as Arc<dyn SinkFactory>,
            generated_dir_name,
        ));

        let preview_interactor = Arc::new(PreviewInteractor::new(
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&sources) as Arc<dyn SourceFactory>,
        ));

        let track_interactor = Arc::new(TrackInteractor::new(
            Arc::clone(&fs_port) as Arc<dyn FsPort>,
            Arc::clone(&sources) as Arc<dyn SourceFactory>,
            Arc::clone(&sinks) as Arc<dyn SinkFactory>,
            Arc::clone(&detectors) as Arc<dyn DetectorLoader>,
            Arc::clone(&trackers) as Arc<dyn TrackerFactory>,
            Arc::clone(&annotator) as Arc<dyn FrameAnnotator>,
        ));

        let detect_interactor = Arc::new(DetectInteractor::new(
            Arc::clone(&detectors) as Arc<dyn DetectorLoader>,
            Arc::clone(&annotator) as Arc<dyn FrameAnnotator>,
        ));

        let fetch_model_interactor = Arc::new(FetchModelInteractor::new(
            Arc::clone(&fetcher) as Arc<dyn ModelFetchPort>,
        ));

        Self {
            inspect_interactor,
            library_interactor,
            cut_interactor,
            preview_interactor,
            track_interactor,
            detect_interactor,
            fetch_model_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }

    fn library_interactor(&self) -> Arc<LibraryInteractor> {
        Arc::clone(&self.library_interactor)
    }

    fn cut_interactor(&self) -> Arc<CutInteractor> {
        Arc::clone(&self.cut_interactor)
    }

    fn preview_interactor(&self) -> Arc<PreviewInteractor> {
        Arc::clone(&self.preview_interactor)
    }

    fn track_interactor(&self) -> Arc<TrackInteractor> {
        Arc::clone(&self.track_interactor)
    }

    fn detect_interactor(&self) -> Arc<DetectInteractor> {
        Arc::clone(&self.detect_interactor)
    }

    fn fetch_model_interactor(&self) -> Arc<FetchModelInteractor> {
        Arc::clone(&self.fetch_model_interactor)
    }
}
