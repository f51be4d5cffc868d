// ONNX detector adapter - YOLOv8 person detection through ONNX Runtime

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use ndarray::{Array4, ArrayViewD};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tracing::{debug, info};

use crate::domain::model::{BBox, Detection, VideoFrame};
use crate::domain::rules::{non_max_suppression, Letterbox};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::media::still::to_rgb_image;
use crate::ports::{DetectorLoader, PersonDetector};

/// COCO class index of "person"
pub const PERSON_CLASS_ID: usize = 0;

/// Where to get the model when it is missing
pub const MODEL_RELEASES_URL: &str = "https://github.com/ultralytics/assets/releases";

/// Detector tuning
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSettings {
    pub input_size: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub intra_threads: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.5,
            iou_threshold: 0.45,
            intra_threads: num_cpus::get().min(4),
        }
    }
}

/// YOLOv8 person detector backed by an ONNX Runtime session
pub struct OnnxPersonDetector {
    session: Session,
    input_name: String,
    output_name: String,
    settings: DetectorSettings,
    model_path: PathBuf,
}

impl OnnxPersonDetector {
    /// Load the model; a missing file is reported with download instructions
    pub fn load(model_path: &Path, settings: DetectorSettings) -> TrimTrackResult<Self> {
        if !model_path.is_file() {
            return Err(TrimTrackError::ModelError {
                message: format!(
                    "Model not found at {}. Run `trimtrack fetch-model` or download yolov8n.onnx from {}",
                    model_path.display(),
                    MODEL_RELEASES_URL
                ),
            });
        }

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(settings.intra_threads.max(1)))
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| TrimTrackError::ModelError {
                message: format!("Failed to load {}: {}", model_path.display(), e),
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| TrimTrackError::ModelError {
                message: "Model declares no inputs".to_string(),
            })?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| TrimTrackError::ModelError {
                message: "Model declares no outputs".to_string(),
            })?;

        info!(
            model = %model_path.display(),
            input = %input_name,
            output = %output_name,
            conf = settings.conf_threshold,
            "Loaded detector model"
        );

        Ok(Self {
            session,
            input_name,
            output_name,
            settings,
            model_path: model_path.to_path_buf(),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }
}

impl PersonDetector for OnnxPersonDetector {
    fn detect(&mut self, frame: &VideoFrame) -> TrimTrackResult<Vec<Detection>> {
        let (input, letterbox) = preprocess(frame, self.settings.input_size)?;

        let tensor = TensorRef::from_array_view(&input).map_err(|e| TrimTrackError::InferenceError {
            message: format!("Failed to wrap input tensor: {}", e),
        })?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(|e| TrimTrackError::InferenceError {
                message: e.to_string(),
            })?;
        let output = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(|e| TrimTrackError::InferenceError {
                message: format!("Unexpected output tensor: {}", e),
            })?;

        let detections = decode_output(
            output.view(),
            &letterbox,
            frame.width,
            frame.height,
            self.settings.conf_threshold,
            self.settings.iou_threshold,
        )?;
        debug!(frame = frame.index, count = detections.len(), "Detected persons");
        Ok(detections)
    }
}

/// Loads an [`OnnxPersonDetector`] from a fixed model path
#[derive(Debug, Clone)]
pub struct OnnxDetectorLoader {
    model_path: PathBuf,
    settings: DetectorSettings,
}

impl OnnxDetectorLoader {
    pub fn new(model_path: impl Into<PathBuf>, settings: DetectorSettings) -> Self {
        Self {
            model_path: model_path.into(),
            settings,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl DetectorLoader for OnnxDetectorLoader {
    fn load(&self) -> TrimTrackResult<Box<dyn PersonDetector>> {
        Ok(Box::new(OnnxPersonDetector::load(&self.model_path, self.settings.clone())?))
    }
}

/// Letterbox a frame into a `(1, 3, size, size)` RGB tensor scaled to [0, 1]
pub fn preprocess(frame: &VideoFrame, size: u32) -> TrimTrackResult<(Array4<f32>, Letterbox)> {
    let letterbox = Letterbox::compute(frame.width, frame.height, size)?;
    let resized = image::imageops::resize(
        &to_rgb_image(frame),
        letterbox.new_width,
        letterbox.new_height,
        FilterType::Triangle,
    );

    let side = size as usize;
    let mut input = Array4::from_elem((1, 3, side, side), f32::from(Letterbox::PAD_VALUE) / 255.0);
    let (pad_x, pad_y) = (letterbox.pad_x as usize, letterbox.pad_y as usize);
    for (x, y, rgb) in resized.enumerate_pixels() {
        let (x, y) = (x as usize + pad_x, y as usize + pad_y);
        let [r, g, b] = rgb.0;
        input[[0, 0, y, x]] = f32::from(r) / 255.0;
        input[[0, 1, y, x]] = f32::from(g) / 255.0;
        input[[0, 2, y, x]] = f32::from(b) / 255.0;
    }
    Ok((input, letterbox))
}

/// Turn a raw YOLOv8 output (`[1, 4 + classes, N]` or `[1, N, 4 + classes]`) into person boxes
pub fn decode_output(
    output: ArrayViewD<'_, f32>,
    letterbox: &Letterbox,
    image_width: u32,
    image_height: u32,
    conf_threshold: f32,
    iou_threshold: f32,
) -> TrimTrackResult<Vec<Detection>> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(TrimTrackError::InferenceError {
            message: format!("Expected a [1, C, N] output, got {:?}", shape),
        });
    }
    // Attribute rows are the short axis
    let channels_first = shape[1] <= shape[2];
    let (attrs, anchors) = if channels_first {
        (shape[1], shape[2])
    } else {
        (shape[2], shape[1])
    };
    if attrs <= 4 + PERSON_CLASS_ID {
        return Err(TrimTrackError::InferenceError {
            message: format!("Output has no class scores: {:?}", shape),
        });
    }
    let value = |attr: usize, anchor: usize| {
        if channels_first {
            output[[0, attr, anchor]]
        } else {
            output[[0, anchor, attr]]
        }
    };

    let mut raw: Vec<(f32, f32, f32, f32, f32)> = Vec::new();
    for anchor in 0..anchors {
        let score = value(4 + PERSON_CLASS_ID, anchor);
        if score > conf_threshold {
            raw.push((
                value(0, anchor),
                value(1, anchor),
                value(2, anchor),
                value(3, anchor),
                score,
            ));
        }
    }
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    // Some exports emit normalized coordinates; scale those up to input pixels
    let max_coord = raw
        .iter()
        .flat_map(|(cx, cy, w, h, _)| [*cx, *cy, *w, *h])
        .fold(0.0f32, f32::max);
    let unit = if max_coord <= 1.5 {
        letterbox.size as f32
    } else {
        1.0
    };

    let (w, h) = (image_width as f32, image_height as f32);
    let candidates = raw
        .into_iter()
        .filter_map(|(cx, cy, bw, bh, score)| {
            let boxed = BBox::from_cxcywh(cx * unit, cy * unit, bw * unit, bh * unit);
            let restored = letterbox.restore(&boxed).clip(w, h);
            (restored.area() > 0.0).then(|| Detection::new(restored, score))
        })
        .collect();

    // Suppression compares sub-pixel boxes; whole pixels only on the way out
    Ok(non_max_suppression(candidates, iou_threshold)
        .into_iter()
        .filter_map(|detection| {
            let b = detection.bbox;
            let pixel = BBox::new(b.x1.trunc(), b.y1.trunc(), b.x2.trunc(), b.y2.trunc());
            (pixel.area() > 0.0).then(|| Detection::new(pixel, detection.confidence))
        })
        .collect())
}
