//! Frame encoding into MPEG-4 files

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::model::{effective_fps, VideoFrame};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{FrameSink, SinkFactory};

/// Target bits per pixel per frame for the MPEG-4 encoder
const BITS_PER_PIXEL: f64 = 0.15;

/// Writes BGR24 frames into an MPEG-4 Part 2 video
pub struct FrameWriter {
    path: PathBuf,
    output: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::encoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    encoder_time_base: ffmpeg_next::Rational,
    stream_time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
    frames_written: i64,
    finished: bool,
}

impl FrameWriter {
    /// Create the output file and write its header
    pub fn create(path: impl Into<PathBuf>, width: u32, height: u32, fps: f64) -> TrimTrackResult<Self> {
        let path = path.into();
        crate::init()?;

        if width == 0 || height == 0 {
            return Err(TrimTrackError::EncodeError {
                message: format!("Invalid output size {}x{}", width, height),
            });
        }

        let mut output = ffmpeg_next::format::output(&path).map_err(|e| TrimTrackError::EncodeError {
            message: format!("Failed to create {}: {}", path.display(), e),
        })?;
        let global_header = output
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).ok_or_else(|| {
            TrimTrackError::EncodeError {
                message: "MPEG-4 encoder is not available in this FFmpeg build".to_string(),
            }
        })?;

        let fps = effective_fps(fps);
        let frame_rate = ffmpeg_next::Rational::new((fps * 1000.0).round() as i32, 1000).reduce();
        let encoder_time_base = frame_rate.invert();

        let (stream_index, encoder) = {
            let mut stream = output.add_stream(codec).map_err(|e| TrimTrackError::EncodeError {
                message: format!("Failed to add video stream: {}", e),
            })?;

            let mut encoder = ffmpeg_next::codec::context::Context::new_with_codec(codec)
                .encoder()
                .video()
                .map_err(|e| TrimTrackError::EncodeError {
                    message: format!("Failed to create video encoder: {}", e),
                })?;

            encoder.set_width(width);
            encoder.set_height(height);
            encoder.set_format(ffmpeg_next::format::Pixel::YUV420P);
            encoder.set_time_base(encoder_time_base);
            encoder.set_frame_rate(Some(frame_rate));
            encoder.set_bit_rate((width as f64 * height as f64 * fps * BITS_PER_PIXEL) as usize);
            if global_header {
                encoder.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
            }

            let encoder = encoder
                .open_with(ffmpeg_next::Dictionary::new())
                .map_err(|e| TrimTrackError::EncodeError {
                    message: format!("Failed to open encoder: {}", e),
                })?;
            stream.set_parameters(&encoder);
            stream.set_time_base(encoder_time_base);
            (stream.index(), encoder)
        };

        output.write_header().map_err(|e| TrimTrackError::EncodeError {
            message: format!("Failed to write output header: {}", e),
        })?;

        // The muxer may replace the stream time base while writing the header
        let stream_time_base = output
            .stream(stream_index)
            .map(|s| s.time_base())
            .unwrap_or(encoder_time_base);

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::BGR24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| TrimTrackError::EncodeError {
            message: format!("Failed to create pixel converter: {}", e),
        })?;

        info!(path = %path.display(), width, height, fps, "Created output video");

        Ok(Self {
            path,
            output,
            encoder,
            scaler,
            stream_index,
            encoder_time_base,
            stream_time_base,
            width,
            height,
            frames_written: 0,
            finished: false,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written as u64
    }

    fn drain_packets(&mut self) -> TrimTrackResult<()> {
        let mut packet = ffmpeg_next::Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut packet) {
                Ok(()) => {}
                Err(e) if is_drained(&e) => return Ok(()),
                Err(e) => {
                    return Err(TrimTrackError::OutputError {
                        message: format!("Failed to receive encoded packet: {}", e),
                    })
                }
            }
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| TrimTrackError::EncodeError {
                    message: format!("Failed to write encoded packet: {}", e),
                })?;
        }
    }
}

/// The encoder wants more input, or has flushed everything
fn is_drained(error: &ffmpeg_next::Error) -> bool {
    match error {
        ffmpeg_next::Error::Eof => true,
        ffmpeg_next::Error::Other { errno } => *errno == ffmpeg_next::util::error::EAGAIN,
        _ => false,
    }
}

impl FrameSink for FrameWriter {
    fn write(&mut self, frame: &VideoFrame) -> TrimTrackResult<()> {
        if self.finished {
            return Err(TrimTrackError::EncodeError {
                message: "Writer already finished".to_string(),
            });
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(TrimTrackError::EncodeError {
                message: format!(
                    "Frame is {}x{}, writer expects {}x{}",
                    frame.width, frame.height, self.width, self.height
                ),
            });
        }

        let mut bgr = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::BGR24,
            self.width,
            self.height,
        );
        let row_len = frame.stride();
        let stride = bgr.stride(0);
        let plane = bgr.data_mut(0);
        for (row, src) in frame.data.chunks_exact(row_len).enumerate() {
            let start = row * stride;
            plane[start..start + row_len].copy_from_slice(src);
        }

        let mut yuv = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&bgr, &mut yuv)
            .map_err(|e| TrimTrackError::EncodeError {
                message: format!("Failed to convert frame: {}", e),
            })?;
        yuv.set_pts(Some(self.frames_written));

        self.encoder
            .send_frame(&yuv)
            .map_err(|e| TrimTrackError::EncodeError {
                message: format!("Failed to send frame to encoder: {}", e),
            })?;
        self.frames_written += 1;
        self.drain_packets()
    }

    fn finish(&mut self) -> TrimTrackResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        self.encoder.send_eof().map_err(|e| TrimTrackError::EncodeError {
            message: format!("Failed to flush encoder: {}", e),
        })?;
        self.drain_packets()?;
        self.output.write_trailer().map_err(|e| TrimTrackError::EncodeError {
            message: format!("Failed to write output trailer: {}", e),
        })?;

        debug!(path = %self.path.display(), frames = self.frames_written, "Closed output video");
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Opens [`FrameWriter`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegSinkFactory;

impl SinkFactory for FfmpegSinkFactory {
    fn create(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        fps: f64,
    ) -> TrimTrackResult<Box<dyn FrameSink>> {
        Ok(Box::new(FrameWriter::create(path, width, height, fps)?))
    }
}
