use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, Stage};
use crate::shared::frame::Frame;
use crate::shared::frame_sequence::FrameSequence;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::video_writer::VideoWriter;

/// Encodes a numbered frame sequence into a single video at a fixed rate.
///
/// Frames are written in ascending index order; the output takes the pixel
/// dimensions of frame 0. Alpha is dropped before encoding.
pub struct AssembleVideoUseCase {
    reader: Box<dyn ImageReader>,
    writer: Box<dyn VideoWriter>,
}

impl AssembleVideoUseCase {
    pub fn new(reader: Box<dyn ImageReader>, writer: Box<dyn VideoWriter>) -> Self {
        Self { reader, writer }
    }

    /// Fails with `Io` for an empty directory or unreadable frame, and with
    /// `Encoding` when the encoder cannot be opened, written or finalized.
    /// A partially written `output` is removed on failure.
    pub fn execute(
        &mut self,
        frames_dir: &Path,
        output: &Path,
        fps: f64,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<VideoMetadata, PipelineError> {
        let result = self.assemble(frames_dir, output, fps, cancelled, logger);
        if result.is_err() {
            if let Err(e) = self.writer.close() {
                log::debug!("Encoder release after failed assembly: {e}");
            }
            if output.exists() {
                if let Err(e) = std::fs::remove_file(output) {
                    log::warn!("Could not remove partial {}: {e}", output.display());
                }
            }
        }
        result
    }

    fn assemble(
        &mut self,
        frames_dir: &Path,
        output: &Path,
        fps: f64,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<VideoMetadata, PipelineError> {
        let started = Instant::now();
        let sequence = FrameSequence::discover(frames_dir)?;

        let first = self.read_frame(&sequence, 0)?;
        let (width, height) = first.dimensions();
        let mut metadata = VideoMetadata::for_encoding(width, height, fps);

        self.writer
            .open(output, &metadata)
            .map_err(|e| PipelineError::encoding("cannot initialize intermediate encoder", e))?;
        logger.info(&format!(
            "Assembling {} frames at {width}x{height}, {fps} fps",
            sequence.len()
        ));

        let total = sequence.len();
        let mut pending = Some(first);
        for index in sequence.indices() {
            if cancelled.load(Ordering::Relaxed) {
                return Err(PipelineError::Cancelled);
            }
            let frame = match pending.take() {
                Some(frame) => frame,
                None => self.read_frame(&sequence, index)?,
            };
            if frame.dimensions() != (width, height) {
                return Err(PipelineError::Io(format!(
                    "frame {index} is {}x{}, expected {width}x{height}",
                    frame.width(),
                    frame.height()
                )));
            }

            self.writer
                .write(&frame.to_rgb())
                .map_err(|e| PipelineError::encoding(format!("cannot encode frame {index}"), e))?;
            logger.progress(Stage::Assembling, index + 1, total);
        }

        self.writer
            .close()
            .map_err(|e| PipelineError::encoding("cannot finalize intermediate video", e))?;

        metadata.total_frames = total;
        metadata.source_path = Some(frames_dir.to_path_buf());
        logger.timing(Stage::Assembling.name(), started.elapsed().as_secs_f64() * 1000.0);
        Ok(metadata)
    }

    fn read_frame(
        &self,
        sequence: &FrameSequence,
        index: usize,
    ) -> Result<Frame, PipelineError> {
        let path = sequence.path_for(index);
        self.reader
            .read(&path)
            .map(|frame| frame.with_index(index))
            .map_err(|e| PipelineError::io(format!("cannot read {}", path.display()), e))
    }
}
