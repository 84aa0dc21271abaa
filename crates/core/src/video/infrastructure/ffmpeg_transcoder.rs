use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::shared::error::PipelineError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::encode_settings::EncodeSettings;
use crate::video::domain::transcoder::Transcoder;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Decodes the assembled video frame by frame and re-encodes it with the
/// delivery settings.
///
/// Every frame is re-timed to `fps` with pts equal to its decode index, so
/// frame order and count (and therefore duration) carry over exactly.
pub struct FfmpegTranscoder;

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        fps: f64,
        settings: &EncodeSettings,
        cancelled: &AtomicBool,
    ) -> Result<VideoMetadata, PipelineError> {
        if input == output {
            return Err(PipelineError::Encoding(format!(
                "refusing to transcode {} onto itself",
                input.display()
            )));
        }
        if !settings.deterministic {
            log::debug!(
                "Transcoding without deterministic mode; output pixels may differ between runs"
            );
        }

        let result = transcode_into(input, output, fps, settings, cancelled);
        if result.is_err() {
            remove_partial_output(output);
        }
        result
    }
}

/// Reader and writer acquired for one transcode. Dropping the session
/// releases both, whichever way the transcode ended.
struct TranscodeSession {
    reader: FfmpegReader,
    writer: FfmpegWriter,
}

impl Drop for TranscodeSession {
    fn drop(&mut self) {
        if let Err(e) = self.writer.close() {
            log::debug!("Encoder release after failed transcode: {e}");
        }
        self.reader.close();
    }
}

fn transcode_into(
    input: &Path,
    output: &Path,
    fps: f64,
    settings: &EncodeSettings,
    cancelled: &AtomicBool,
) -> Result<VideoMetadata, PipelineError> {
    let mut session = TranscodeSession {
        reader: FfmpegReader::new(),
        writer: FfmpegWriter::new(settings.clone()),
    };

    let source = session
        .reader
        .open(input)
        .map_err(|e| PipelineError::encoding(format!("cannot read {}", input.display()), e))?;

    let target = VideoMetadata::for_encoding(source.width, source.height, fps);
    session.writer.open(output, &target).map_err(|e| {
        PipelineError::encoding(
            format!("cannot initialize {} encoder", settings.codec.name()),
            e,
        )
    })?;

    let mut count = 0usize;
    for frame in session.reader.frames() {
        if cancelled.load(Ordering::Relaxed) {
            return Err(PipelineError::Cancelled);
        }
        let frame = frame.map_err(|e| {
            PipelineError::encoding(format!("decode failed at frame {count}"), e)
        })?;
        session
            .writer
            .write(&frame.with_index(count))
            .map_err(|e| PipelineError::encoding(format!("encode failed at frame {count}"), e))?;
        count += 1;
    }

    if count == 0 {
        return Err(PipelineError::Encoding(format!(
            "{} contains no decodable frames",
            input.display()
        )));
    }

    session
        .writer
        .close()
        .map_err(|e| PipelineError::encoding("cannot finalize delivery file", e))?;

    log::info!(
        "Transcoded {count} frames to {} ({}, {:.2}s)",
        output.display(),
        settings.codec.name(),
        count as f64 / fps
    );

    Ok(VideoMetadata {
        width: source.width,
        height: source.height,
        fps,
        total_frames: count,
        codec: settings.codec.name().to_string(),
        source_path: Some(input.to_path_buf()),
    })
}

fn remove_partial_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => log::warn!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial output {}: {e}", output.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::domain::encode_settings::VideoCodec;
    use crate::video::infrastructure::test_video::{
        create_test_video, decode_all, gray_frames, mean,
    };

    fn mpeg4_delivery() -> EncodeSettings {
        EncodeSettings {
            codec: VideoCodec::Mpeg4,
            bitrate: Some(2_000_000),
            deterministic: true,
        }
    }

    fn assembled(dir: &Path, count: usize) -> std::path::PathBuf {
        let path = dir.join("assembled.mp4");
        create_test_video(&path, &gray_frames(count, 160, 96), 24.0);
        path
    }

    #[test]
    fn test_preserves_frame_count_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 5);
        let output = dir.path().join("final.mp4");

        let meta = FfmpegTranscoder::new()
            .transcode(&input, &output, 24.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(meta.total_frames, 5);
        assert_eq!((meta.width, meta.height), (160, 96));

        let frames = decode_all(&output);
        assert_eq!(frames.len(), 5);
        let means: Vec<f64> = frames.iter().map(mean).collect();
        for pair in means.windows(2) {
            assert!(pair[0] < pair[1], "order not preserved: {means:?}");
        }
    }

    #[test]
    fn test_twice_yields_same_count_and_duration() {
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 6);
        let first = dir.path().join("first.mp4");
        let second = dir.path().join("second.mp4");
        let transcoder = FfmpegTranscoder::new();

        let a = transcoder
            .transcode(&input, &first, 24.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap();
        let b = transcoder
            .transcode(&input, &second, 24.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap();

        assert_eq!(a.total_frames, b.total_frames);
        assert_eq!(a.duration_secs(), b.duration_secs());
        assert_eq!(decode_all(&first).len(), decode_all(&second).len());
    }

    #[test]
    fn test_h264_delivery_when_available() {
        ffmpeg_next::init().unwrap();
        if ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::H264).is_none() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 4);
        let output = dir.path().join("final.mp4");

        let meta = FfmpegTranscoder::new()
            .transcode(&input, &output, 24.0, &EncodeSettings::delivery(), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(meta.codec, "h264");
        assert_eq!(decode_all(&output).len(), 4);
    }

    #[test]
    fn test_unreadable_input_is_encoding_error_and_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.mp4");
        std::fs::write(&input, b"garbage").unwrap();
        let output = dir.path().join("final.mp4");

        let err = FfmpegTranscoder::new()
            .transcode(&input, &output, 24.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_is_encoding_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FfmpegTranscoder::new()
            .transcode(
                Path::new("/nonexistent/assembled.mp4"),
                &dir.path().join("final.mp4"),
                24.0,
                &mpeg4_delivery(),
                &AtomicBool::new(false),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
    }

    #[test]
    fn test_invalid_fps_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 2);
        let output = dir.path().join("final.mp4");

        let err = FfmpegTranscoder::new()
            .transcode(&input, &output, 0.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_cancelled_stops_and_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 3);
        let output = dir.path().join("final.mp4");

        let err = FfmpegTranscoder::new()
            .transcode(&input, &output, 24.0, &mpeg4_delivery(), &AtomicBool::new(true))
            .unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);
        assert!(!output.exists());
        assert!(input.exists());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = assembled(dir.path(), 1);
        let err = FfmpegTranscoder::new()
            .transcode(&input, &input, 24.0, &mpeg4_delivery(), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encoding(_)));
        assert!(input.exists());
    }
}
