//! Frame decoding on top of libav

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::model::{effective_fps, VideoFrame, VideoInfo};
use crate::error::{TrimTrackError, TrimTrackResult};
use crate::ports::{FrameSource, SourceFactory};

/// Read the video properties of a file without decoding it
pub fn probe(path: &Path) -> TrimTrackResult<VideoInfo> {
    crate::init()?;
    ensure_exists(path)?;

    let input = ffmpeg_next::format::input(&path).map_err(|e| TrimTrackError::ProbeError {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;
    let stream = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| TrimTrackError::ProbeError {
            message: format!("No video stream found in {}", path.display()),
        })?;
    let params = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| TrimTrackError::ProbeError {
            message: format!("Failed to read codec parameters: {}", e),
        })?;
    let video = params.decoder().video().map_err(|e| TrimTrackError::ProbeError {
        message: format!("Failed to create video decoder: {}", e),
    })?;

    Ok(stream_info(path, &input, &stream, video.width(), video.height()))
}

fn ensure_exists(path: &Path) -> TrimTrackResult<()> {
    if !path.is_file() {
        return Err(TrimTrackError::InputFileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

fn rational_to_f64(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        f64::from(rate.numerator()) / f64::from(rate.denominator())
    }
}

fn stream_info(
    path: &Path,
    input: &ffmpeg_next::format::context::Input,
    stream: &ffmpeg_next::format::stream::Stream,
    width: u32,
    height: u32,
) -> VideoInfo {
    let fps = effective_fps(match rational_to_f64(stream.avg_frame_rate()) {
        rate if rate > 0.0 => rate,
        _ => rational_to_f64(stream.rate()),
    });

    let total_frames = if stream.frames() > 0 {
        stream.frames() as u64
    } else {
        // Containers without a frame count: estimate from the duration
        let seconds = if stream.duration() > 0 {
            stream.duration() as f64 * rational_to_f64(stream.time_base())
        } else {
            input.duration().max(0) as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        };
        (seconds * fps).round() as u64
    };

    VideoInfo::new(path, width, height, fps, total_frames)
}

/// Numbers decoded frames. Timestamps win; frames without one continue the
/// count, which a seek restarts at the target index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FrameCounter {
    next: u64,
    seeked: bool,
}

impl FrameCounter {
    fn seek_to(&mut self, index: u64) {
        self.next = index;
        self.seeked = true;
    }

    /// Index of the next decoded frame, given the index its timestamp implies
    fn assign(&mut self, from_pts: Option<u64>) -> u64 {
        let index = match from_pts {
            // Seeks land on an earlier keyframe, so trust its timestamp
            Some(index) if self.seeked => index,
            Some(index) => index.max(self.next),
            None => self.next,
        };
        self.seeked = false;
        self.next = index + 1;
        index
    }
}

/// Decodes the best video stream of a file into BGR24 frames
pub struct FrameReader {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    time_base: f64,
    start_pts: i64,
    info: VideoInfo,
    counter: FrameCounter,
    eof_sent: bool,
    pending: Option<VideoFrame>,
}

impl FrameReader {
    /// Open a file for decoding
    pub fn open(path: impl Into<PathBuf>) -> TrimTrackResult<Self> {
        let path = path.into();
        crate::init()?;
        ensure_exists(&path)?;

        let input = ffmpeg_next::format::input(&path).map_err(|e| TrimTrackError::DecodeError {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| TrimTrackError::DecodeError {
                message: format!("No video stream found in {}", path.display()),
            })?;
        let stream_index = stream.index();
        let time_base = rational_to_f64(stream.time_base());
        let start_pts = match stream.start_time() {
            pts if pts == ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
            pts => pts,
        };

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| TrimTrackError::DecodeError {
                message: format!("Failed to create decoder context: {}", e),
            })?
            .decoder()
            .video()
            .map_err(|e| TrimTrackError::DecodeError {
                message: format!("Failed to create video decoder: {}", e),
            })?;

        let info = stream_info(&path, &input, &stream, decoder.width(), decoder.height());

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::BGR24,
            decoder.width(),
            decoder.height(),
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| TrimTrackError::DecodeError {
            message: format!("Failed to create pixel converter: {}", e),
        })?;

        info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            frames = info.total_frames,
            "Opened video"
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            start_pts,
            info,
            counter: FrameCounter::default(),
            eof_sent: false,
            pending: None,
        })
    }

    /// Decode the frame at `index`
    pub fn read_at(&mut self, index: u64) -> TrimTrackResult<Option<VideoFrame>> {
        self.seek(index)?;
        self.read()
    }

    /// Frame index implied by a presentation timestamp
    fn index_for_pts(&self, pts: i64) -> u64 {
        let seconds = (pts - self.start_pts) as f64 * self.time_base;
        (seconds * self.info.fps).round().max(0.0) as u64
    }

    fn decode_next(&mut self) -> TrimTrackResult<Option<VideoFrame>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let from_pts = decoded.timestamp().map(|pts| self.index_for_pts(pts));
                    let index = self.counter.assign(from_pts);
                    return self.convert(&decoded, index).map(Some);
                }
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                    if self.eof_sent {
                        return Ok(None);
                    }
                }
                Err(e) => {
                    return Err(TrimTrackError::DecodeError {
                        message: format!("Failed to receive frame: {}", e),
                    })
                }
            }

            self.feed_packet()?;
        }
    }

    /// Push the next packet of our stream into the decoder, or signal end of stream
    fn feed_packet(&mut self) -> TrimTrackResult<()> {
        let mut packet = ffmpeg_next::Packet::empty();
        loop {
            match packet.read(&mut self.input) {
                Ok(()) if packet.stream() == self.stream_index => {
                    return self.decoder.send_packet(&packet).map_err(|e| {
                        TrimTrackError::DecodeError {
                            message: format!("Failed to send packet to decoder: {}", e),
                        }
                    });
                }
                Ok(()) => continue,
                Err(ffmpeg_next::Error::Eof) => {
                    self.eof_sent = true;
                    return self.decoder.send_eof().map_err(|e| TrimTrackError::DecodeError {
                        message: format!("Failed to flush decoder: {}", e),
                    });
                }
                Err(e) => {
                    return Err(TrimTrackError::DecodeError {
                        message: format!("Failed to read packet: {}", e),
                    })
                }
            }
        }
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
        index: u64,
    ) -> TrimTrackResult<VideoFrame> {
        let mut bgr = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(decoded, &mut bgr)
            .map_err(|e| TrimTrackError::DecodeError {
                message: format!("Failed to convert frame: {}", e),
            })?;

        let width = bgr.width();
        let height = bgr.height();
        let row_len = width as usize * VideoFrame::CHANNELS;
        let stride = bgr.stride(0);
        let plane = bgr.data(0);

        let mut data = Vec::with_capacity(row_len * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            data.extend_from_slice(&plane[start..start + row_len]);
        }

        Ok(VideoFrame::new(index, width, height, data)?)
    }
}

impl FrameSource for FrameReader {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read(&mut self) -> TrimTrackResult<Option<VideoFrame>> {
        if let Some(frame) = self.pending.take() {
            return Ok(Some(frame));
        }
        self.decode_next()
    }

    fn seek(&mut self, index: u64) -> TrimTrackResult<()> {
        let seconds = index as f64 / self.info.fps;
        let offset = (self.start_pts as f64 * self.time_base * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64;
        let target = (seconds * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64 + offset;

        // Land on the keyframe at or before the target, then decode forward
        self.input
            .seek(target, ..target)
            .map_err(|e| TrimTrackError::DecodeError {
                message: format!("Failed to seek to frame {}: {}", index, e),
            })?;
        self.decoder.flush();
        self.eof_sent = false;
        self.pending = None;
        self.counter.seek_to(index);

        let mut skipped = 0u64;
        while let Some(frame) = self.decode_next()? {
            if frame.index >= index {
                self.pending = Some(frame);
                break;
            }
            skipped += 1;
        }
        debug!(index, skipped, "Seek complete");
        Ok(())
    }
}

/// Opens [`FrameReader`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegSourceFactory;

impl SourceFactory for FfmpegSourceFactory {
    fn open(&self, path: &Path) -> TrimTrackResult<Box<dyn FrameSource>> {
        Ok(Box::new(FrameReader::open(path)?))
    }
}
