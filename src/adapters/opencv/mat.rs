//! Conversions between [`VideoFrame`]s and OpenCV matrices

use opencv::core::{Mat, Rect, Rect2d, Scalar, CV_8UC3};
use opencv::prelude::*;

use crate::domain::model::{BBox, VideoFrame};
use crate::error::{TrimTrackError, TrimTrackResult};

/// Copy a BGR24 frame into a new 8UC3 matrix
pub fn frame_to_mat(frame: &VideoFrame) -> TrimTrackResult<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

/// Copy the pixels of a matrix back into a frame of the same size
pub fn mat_into_frame(mat: &Mat, frame: &mut VideoFrame) -> TrimTrackResult<()> {
    let bytes = mat.data_bytes()?;
    if bytes.len() != frame.data.len() {
        return Err(TrimTrackError::OutputError {
            message: format!(
                "Matrix holds {} bytes, frame expects {}",
                bytes.len(),
                frame.data.len()
            ),
        });
    }
    frame.data.copy_from_slice(bytes);
    Ok(())
}

/// Integer rectangle for a corner box; coordinates are truncated
pub fn bbox_to_rect(bbox: &BBox) -> Rect {
    Rect::new(
        bbox.x1 as i32,
        bbox.y1 as i32,
        (bbox.x2 - bbox.x1) as i32,
        (bbox.y2 - bbox.y1) as i32,
    )
}

pub fn rect_to_bbox(rect: &Rect) -> BBox {
    BBox::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

pub fn bbox_to_rect2d(bbox: &BBox) -> Rect2d {
    let rect = bbox_to_rect(bbox);
    Rect2d::new(
        f64::from(rect.x),
        f64::from(rect.y),
        f64::from(rect.width),
        f64::from(rect.height),
    )
}

/// Legacy trackers report sub-pixel boxes; truncate like the integer ones
pub fn rect2d_to_bbox(rect: &Rect2d) -> BBox {
    rect_to_bbox(&Rect::new(
        rect.x as i32,
        rect.y as i32,
        rect.width as i32,
        rect.height as i32,
    ))
}
