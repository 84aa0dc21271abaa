use std::sync::atomic::AtomicBool;
use std::time::Instant;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::pipeline::composite_executor::{CompositeExecutor, CompositeJob};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::{PipelineError, Stage};
use crate::shared::frame_sequence::FrameSequence;
use crate::shared::product_image::ProductImage;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::image_writer::ImageWriter;

/// Replaces every extracted frame with the product composited over it.
///
/// Wires the compositor and frame I/O together and delegates scheduling to
/// a [`CompositeExecutor`]. Frames are overwritten in place, keeping their
/// file names, so the sequence is still discoverable afterwards.
pub struct CompositeFramesUseCase {
    compositor: Box<dyn FrameCompositor>,
    reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
    executor: Box<dyn CompositeExecutor>,
}

impl CompositeFramesUseCase {
    pub fn new(
        compositor: Box<dyn FrameCompositor>,
        reader: Box<dyn ImageReader>,
        writer: Box<dyn ImageWriter>,
        executor: Box<dyn CompositeExecutor>,
    ) -> Self {
        Self {
            compositor,
            reader,
            writer,
            executor,
        }
    }

    /// Returns the number of frames composited, always `frames.len()`.
    pub fn execute(
        &self,
        frames: &FrameSequence,
        product: &ProductImage,
        cancelled: &AtomicBool,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, PipelineError> {
        let started = Instant::now();
        let job = CompositeJob {
            frames,
            product,
            compositor: self.compositor.as_ref(),
            reader: self.reader.as_ref(),
            writer: self.writer.as_ref(),
            cancelled,
        };

        let count = self.executor.execute(&job, logger)?;

        logger.timing(Stage::Compositing.name(), started.elapsed().as_secs_f64() * 1000.0);
        Ok(count)
    }
}
