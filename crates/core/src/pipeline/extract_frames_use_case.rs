use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, Stage};
use crate::shared::frame_sequence::{self, FrameSequence};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

/// Decodes every frame of a video, in presentation order, into a numbered
/// PNG sequence.
pub struct ExtractFramesUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn ImageWriter>,
}

impl ExtractFramesUseCase {
    pub fn new(reader: Box<dyn VideoReader>, writer: Box<dyn ImageWriter>) -> Self {
        Self { reader, writer }
    }

    /// Extracts `video` into `frames_dir` and returns the written sequence;
    /// its `len()` is the frame count.
    ///
    /// `frames_dir` is created if missing and must not already hold frame
    /// files. The source video is never modified.
    pub fn execute(
        &mut self,
        video: &Path,
        frames_dir: &Path,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameSequence, PipelineError> {
        prepare_dir(frames_dir)?;

        let result = self.extract(video, frames_dir, cancelled, logger);
        self.reader.close();
        result
    }

    fn extract(
        &mut self,
        video: &Path,
        frames_dir: &Path,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameSequence, PipelineError> {
        let started = Instant::now();
        let metadata = self
            .reader
            .open(video)
            .map_err(|e| PipelineError::io(format!("cannot open {}", video.display()), e))?;
        logger.info(&format!(
            "Extracting {} ({}x{} @ {:.2} fps)",
            video.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        let mut sequence = FrameSequence::empty(frames_dir);
        for frame in self.reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                return Err(PipelineError::Cancelled);
            }
            let frame = frame.map_err(|e| {
                PipelineError::io(format!("decode failed after frame {}", sequence.len()), e)
            })?;

            let (index, path) = sequence.push_index()?;
            self.writer
                .write(&path, &frame.with_index(index))
                .map_err(|e| PipelineError::io(format!("cannot write {}", path.display()), e))?;

            let done = sequence.len();
            logger.progress(Stage::Extracting, done, metadata.total_frames.max(done));
        }

        if sequence.is_empty() {
            return Err(PipelineError::Io(format!(
                "{} contains no decodable frames",
                video.display()
            )));
        }

        logger.timing(Stage::Extracting.name(), started.elapsed().as_secs_f64() * 1000.0);
        logger.metric("frames", sequence.len() as f64);
        Ok(sequence)
    }
}

fn prepare_dir(frames_dir: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(frames_dir)
        .map_err(|e| PipelineError::io(format!("cannot create {}", frames_dir.display()), e))?;

    let entries = std::fs::read_dir(frames_dir)
        .map_err(|e| PipelineError::io(format!("cannot read {}", frames_dir.display()), e))?;
    for entry in entries {
        let name = entry?.file_name();
        if name.to_str().and_then(frame_sequence::parse_index).is_some() {
            return Err(PipelineError::Io(format!(
                "{} already contains frames",
                frames_dir.display()
            )));
        }
    }
    Ok(())
}
