use std::sync::atomic::AtomicBool;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::error::PipelineError;
use crate::shared::frame_sequence::FrameSequence;
use crate::shared::product_image::ProductImage;
use crate::video::domain::image_reader::ImageReader;
use crate::video::domain::image_writer::ImageWriter;

/// Everything needed to composite one frame sequence in place.
///
/// Shared by reference with every worker, so all parts are `Sync`.
pub struct CompositeJob<'a> {
    pub frames: &'a FrameSequence,
    pub product: &'a ProductImage,
    pub compositor: &'a dyn FrameCompositor,
    pub reader: &'a dyn ImageReader,
    pub writer: &'a dyn ImageWriter,
    pub cancelled: &'a AtomicBool,
}

impl CompositeJob<'_> {
    /// Replaces frame `index` on disk with its composited counterpart.
    pub fn composite_one(&self, index: usize) -> Result<(), PipelineError> {
        let path = self.frames.path_for(index);
        let background = self
            .reader
            .read(&path)
            .map_err(|e| PipelineError::io(format!("cannot read {}", path.display()), e))?
            .with_index(index);

        let composited = self.compositor.composite(&background, self.product)?;

        self.writer
            .write(&path, &composited)
            .map_err(|e| PipelineError::io(format!("cannot write {}", path.display()), e))
    }
}

/// Abstracts how the per-frame compositing loop is scheduled.
///
/// Frames share no state, so implementations may process them in any order;
/// results are keyed by index on disk. The first error stops the run, and
/// cancellation is observed between frames. The logger is only ever called
/// from the thread that invoked `execute`.
pub trait CompositeExecutor: Send {
    /// Returns the number of frames composited.
    fn execute(
        &self,
        job: &CompositeJob<'_>,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, PipelineError>;
}
