use ndarray::{Axis, Zip};

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;
use crate::shared::product_image::ProductImage;

/// CPU "over" blend of the product cut-out onto an opaque background.
///
/// Per pixel and per color channel:
/// `out = round(bg * (1 - a) + fg * a)` with `a = alpha / 255`.
/// A 4-channel background is treated as fully opaque (its alpha is ignored)
/// and the product's alpha never reaches the output.
pub struct AlphaCompositor;

impl AlphaCompositor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlphaCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCompositor for AlphaCompositor {
    fn composite(
        &self,
        background: &Frame,
        product: &ProductImage,
    ) -> Result<Frame, PipelineError> {
        if background.dimensions() != product.dimensions() {
            return Err(PipelineError::DimensionMismatch {
                background: background.dimensions(),
                product: product.dimensions(),
            });
        }
        if background.channels() < 3 {
            return Err(PipelineError::Io(format!(
                "background frame {} has {} channels, expected 3 or 4",
                background.index(),
                background.channels()
            )));
        }

        let (w, h) = background.dimensions();
        let mut out = Frame::new(
            vec![0; w as usize * h as usize * 3],
            w,
            h,
            3,
            background.index(),
        );

        Zip::from(out.as_ndarray_mut().lanes_mut(Axis(2)))
            .and(background.as_ndarray().lanes(Axis(2)))
            .and(product.as_frame().as_ndarray().lanes(Axis(2)))
            .for_each(|mut dst, bg, fg| {
                let a = fg[3] as f32 / 255.0;
                for c in 0..3 {
                    dst[c] = blend(bg[c], fg[c], a);
                }
            });

        Ok(out)
    }
}

#[inline]
fn blend(bg: u8, fg: u8, a: f32) -> u8 {
    (bg as f32 * (1.0 - a) + fg as f32 * a)
        .round()
        .clamp(0.0, 255.0) as u8
}
