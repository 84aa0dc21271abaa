use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::encode_settings::{EncodeSettings, VideoCodec};
use crate::video::domain::video_writer::VideoWriter;

/// Encodes RGB frames into a video container via ffmpeg-next.
///
/// The codec, bitrate, and determinism come from [`EncodeSettings`]; the
/// container format is inferred from the output extension.
pub struct FfmpegWriter {
    settings: EncodeSettings,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new(settings: EncodeSettings) -> Self {
        Self {
            settings,
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: ffmpeg_next::Rational(1, 1),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    /// Number of frames accepted since the last `open`.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn drain_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        let ost_time_base = octx
            .stream(self.video_stream_index)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(self.video_stream_index);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(octx)?;
        }
        Ok(())
    }

    /// Flushes buffered packets and writes the container trailer.
    fn finish(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_eof()?;
        }
        self.drain_packets()?;
        if let Some(octx) = self.octx.as_mut() {
            octx.write_trailer()?;
        }
        Ok(())
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new(EncodeSettings::default())
    }
}

fn find_encoder(codec: VideoCodec) -> Result<ffmpeg_next::Codec, Box<dyn std::error::Error>> {
    let id = match codec {
        VideoCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        VideoCodec::H264 => ffmpeg_next::codec::Id::H264,
    };
    ffmpeg_next::encoder::find(id).ok_or_else(|| {
        format!("{} encoder not available in this ffmpeg build", codec.name()).into()
    })
}

/// Frame rate as an exact rational; integral rates stay integral.
fn frame_rate(fps: f64) -> Result<ffmpeg_next::Rational, Box<dyn std::error::Error>> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(format!("invalid frame rate {fps}").into());
    }
    if (fps - fps.round()).abs() < 1e-9 {
        Ok(ffmpeg_next::Rational(fps.round() as i32, 1))
    } else {
        Ok(ffmpeg_next::Rational::from(fps))
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let rate = frame_rate(metadata.fps)?;
        let codec = find_encoder(self.settings.codec)?;

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(rate.invert());
        encoder_ctx.set_frame_rate(Some(rate));
        encoder_ctx.set_bit_rate(self.settings.bitrate_for(
            metadata.width,
            metadata.height,
            metadata.fps,
        ));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut options = ffmpeg_next::Dictionary::new();
        if self.settings.deterministic {
            options.set("threads", "1");
        }

        let encoder = encoder_ctx.open_with(options)?;
        ost.set_parameters(&encoder);
        let video_stream_index = ost.index();

        octx.write_header()?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Encoding {} as {} {}x{} @ {} fps",
            path.display(),
            self.settings.codec.name(),
            metadata.width,
            metadata.height,
            metadata.fps
        );

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = rate.invert();
        self.video_stream_index = video_stream_index;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            return Err("FfmpegWriter: not opened".into());
        }
        if frame.channels() != 3 {
            return Err(format!(
                "FfmpegWriter expects RGB frames, got {} channels",
                frame.channels()
            )
            .into());
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(format!(
                "frame {} is {}x{}, stream is {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let stride = rgb_frame.stride(0);
        let row_len = self.width as usize * 3;
        let data = rgb_frame.data_mut(0);
        let src = frame.data();

        // Copy pixel data, respecting stride
        for row in 0..self.height as usize {
            let src_start = row * row_len;
            let dst_start = row * stride;
            data[dst_start..dst_start + row_len]
                .copy_from_slice(&src[src_start..src_start + row_len]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler.run(&rgb_frame, &mut yuv_frame)?;
        }
        yuv_frame.set_pts(Some(self.frame_count as i64));

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.send_frame(&yuv_frame)?;
        }
        self.drain_packets()?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            return Ok(());
        }

        let result = self.finish();

        self.octx = None;
        self.encoder = None;
        self.scaler = None;

        result
    }
}
