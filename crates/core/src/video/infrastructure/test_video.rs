//! Synthetic video fixtures for tests. Encodes with MPEG-4 so no external
//! encoder library is required.

use std::path::Path;

use crate::shared::frame::Frame;

/// Solid gray frames whose brightness steps by 40 per index.
pub fn gray_frames(count: usize, width: u32, height: u32) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            let value = ((i * 40) % 200 + 20) as u8;
            Frame::new(
                vec![value; (width * height * 3) as usize],
                width,
                height,
                3,
                i,
            )
        })
        .collect()
}

pub fn create_test_video(path: &Path, frames: &[Frame], fps: f64) {
    ffmpeg_next::init().unwrap();

    let width = frames[0].width();
    let height = frames[0].height();
    let fps_i = fps.round() as i32;

    let mut octx = ffmpeg_next::format::output(path).unwrap();

    let global_header = octx
        .format()
        .flags()
        .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

    let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
    let mut ost = octx.add_stream(Some(codec)).unwrap();

    let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
        .encoder()
        .video()
        .unwrap();

    encoder_ctx.set_width(width);
    encoder_ctx.set_height(height);
    encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
    encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps_i));
    encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps_i, 1)));

    if global_header {
        encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
    }

    let mut encoder = encoder_ctx
        .open_with(ffmpeg_next::Dictionary::new())
        .unwrap();
    ost.set_parameters(&encoder);

    octx.write_header().unwrap();

    let ost_time_base = octx.stream(0).unwrap().time_base();

    let mut scaler = ffmpeg_next::software::scaling::Context::get(
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::format::Pixel::YUV420P,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .unwrap();

    let drain = |encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
                 octx: &mut ffmpeg_next::format::context::Output| {
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps_i), ost_time_base);
            encoded.write_interleaved(octx).unwrap();
        }
    };

    for (i, frame) in frames.iter().enumerate() {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
        );
        let stride = rgb_frame.stride(0);
        let row_len = width as usize * 3;
        let data = rgb_frame.data_mut(0);
        for row in 0..height as usize {
            data[row * stride..row * stride + row_len]
                .copy_from_slice(&frame.data()[row * row_len..(row + 1) * row_len]);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
        yuv_frame.set_pts(Some(i as i64));

        encoder.send_frame(&yuv_frame).unwrap();
        drain(&mut encoder, &mut octx);
    }

    encoder.send_eof().unwrap();
    drain(&mut encoder, &mut octx);

    octx.write_trailer().unwrap();
}

/// Decodes every frame of `path` with the production reader.
pub fn decode_all(path: &Path) -> Vec<Frame> {
    use crate::video::domain::video_reader::VideoReader;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

    let mut reader = FfmpegReader::new();
    reader.open(path).unwrap();
    let frames = reader.frames().map(|f| f.unwrap()).collect();
    reader.close();
    frames
}

pub fn mean(frame: &Frame) -> f64 {
    frame.data().iter().map(|&b| b as f64).sum::<f64>() / frame.data().len() as f64
}
