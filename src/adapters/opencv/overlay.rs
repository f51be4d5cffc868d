//! Tracking overlay drawn with OpenCV primitives

use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;

use super::mat::{bbox_to_rect, frame_to_mat, mat_into_frame};
use crate::domain::model::{Detection, TrackMethod, TrackResult, VideoFrame};
use crate::domain::rules::color_for_id;
use crate::error::TrimTrackResult;
use crate::ports::{FrameAnnotator, OverlayStats};

const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

fn bgr(color: [u8; 3]) -> Scalar {
    Scalar::new(
        f64::from(color[0]),
        f64::from(color[1]),
        f64::from(color[2]),
        0.0,
    )
}

fn white() -> Scalar {
    Scalar::new(255.0, 255.0, 255.0, 0.0)
}

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn text(mat: &mut Mat, label: &str, origin: Point, scale: f64, color: Scalar, thickness: i32) -> TrimTrackResult<()> {
    imgproc::put_text(
        mat,
        label,
        origin,
        FONT,
        scale,
        color,
        thickness,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// Draws track boxes, id tags and the stats header
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvAnnotator;

impl OpenCvAnnotator {
    fn draw_track(mat: &mut Mat, result: &TrackResult) -> TrimTrackResult<()> {
        let color = bgr(color_for_id(result.id));
        let rect = bbox_to_rect(&result.bbox);
        let thickness = match result.method {
            TrackMethod::Yolo => 3,
            TrackMethod::Tracker => 2,
        };
        imgproc::rectangle(mat, rect, color, thickness, imgproc::LINE_8, 0)?;

        // Id tag on a filled background above the box
        let label = format!("ID:{}", result.id);
        let mut baseline = 0;
        let size = imgproc::get_text_size(&label, FONT, 0.8, 2, &mut baseline)?;
        let background = Rect::new(
            rect.x,
            rect.y - size.height - 10,
            size.width + 10,
            size.height + 10,
        );
        imgproc::rectangle(mat, background, color, imgproc::FILLED, imgproc::LINE_8, 0)?;
        text(mat, &label, Point::new(rect.x + 5, rect.y - 5), 0.8, white(), 2)?;

        let info = format!("{} {:.2}", result.method, result.confidence);
        text(mat, &info, Point::new(rect.x, rect.y + rect.height + 20), 0.5, color, 1)
    }
}

impl FrameAnnotator for OpenCvAnnotator {
    fn annotate(
        &self,
        frame: &mut VideoFrame,
        results: &[TrackResult],
        stats: &OverlayStats,
    ) -> TrimTrackResult<()> {
        let mut mat = frame_to_mat(frame)?;
        for result in results {
            Self::draw_track(&mut mat, result)?;
        }

        let header = format!(
            "Tracking: {} | Total IDs: {} | FPS: {:.1}",
            stats.active_tracks, stats.total_ids, stats.fps
        );
        text(&mut mat, &header, Point::new(10, 30), 0.7, white(), 2)?;

        mat_into_frame(&mat, frame)
    }

    fn annotate_detections(
        &self,
        frame: &mut VideoFrame,
        detections: &[Detection],
    ) -> TrimTrackResult<()> {
        let mut mat = frame_to_mat(frame)?;
        for detection in detections {
            let rect = bbox_to_rect(&detection.bbox);
            imgproc::rectangle(&mut mat, rect, green(), 2, imgproc::LINE_8, 0)?;
            let label = format!("person {:.2}", detection.confidence);
            text(&mut mat, &label, Point::new(rect.x, rect.y - 10), 0.6, green(), 2)?;
        }
        mat_into_frame(&mat, frame)
    }
}
