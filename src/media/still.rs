//! Still images: conversions between frames and `image` buffers

use std::path::Path;

use image::RgbImage;

use crate::domain::model::VideoFrame;
use crate::error::TrimTrackResult;

/// Frame as an RGB image
pub fn to_rgb_image(frame: &VideoFrame) -> RgbImage {
    let mut rgb = Vec::with_capacity(frame.data.len());
    for px in frame.data.chunks_exact(VideoFrame::CHANNELS) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    // Lengths always match the dimensions here
    RgbImage::from_raw(frame.width, frame.height, rgb)
        .unwrap_or_else(|| RgbImage::new(frame.width, frame.height))
}

/// RGB image as a BGR frame
pub fn from_rgb_image(index: u64, image: &RgbImage) -> VideoFrame {
    let mut data = Vec::with_capacity(image.as_raw().len());
    for px in image.pixels() {
        data.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    VideoFrame {
        index,
        width: image.width(),
        height: image.height(),
        data,
    }
}

/// Load any image file the `image` crate understands as a frame
pub fn load_frame(path: &Path) -> TrimTrackResult<VideoFrame> {
    let image = image::open(path)?.to_rgb8();
    Ok(from_rgb_image(0, &image))
}

/// Save a frame; the format follows the file extension
pub fn save_frame(frame: &VideoFrame, path: &Path) -> TrimTrackResult<()> {
    to_rgb_image(frame).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order_round_trip() {
        let frame = VideoFrame::filled(3, 2, 2, [10, 20, 30]);
        let image = to_rgb_image(&frame);
        assert_eq!(image.get_pixel(1, 1).0, [30, 20, 10]);

        let back = from_rgb_image(3, &image);
        assert_eq!(back, frame);
    }

    #[test]
    fn test_save_and_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let frame = VideoFrame::filled(0, 4, 3, [255, 0, 0]);

        save_frame(&frame, &path).unwrap();
        let loaded = load_frame(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert_eq!(loaded.pixel(0, 0), Some([255, 0, 0]));
    }
}
