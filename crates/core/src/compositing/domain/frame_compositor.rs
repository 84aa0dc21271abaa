use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::product_image::ProductImage;

/// Domain interface for laying the product cut-out over one video frame.
///
/// Implementations must be stateless across frames so the pipeline can run
/// them from several workers at once.
pub trait FrameCompositor: Send + Sync {
    /// Returns a new opaque 3-channel frame carrying `background`'s index.
    ///
    /// Fails with [`PipelineError::DimensionMismatch`] when the two images do
    /// not share the same width and height; no resampling is attempted.
    fn composite(&self, background: &Frame, product: &ProductImage)
        -> Result<Frame, PipelineError>;
}
