use crate::shared::error::PipelineError;
use crate::shared::frame::Frame;

/// The transparency-carrying product cut-out composited onto every frame.
///
/// Always RGBA. Loaded once per run and shared read-only between compositing
/// workers.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductImage {
    frame: Frame,
}

impl ProductImage {
    /// Wraps RGBA bytes. RGB input is promoted to fully opaque RGBA.
    pub fn from_frame(frame: Frame) -> Result<Self, PipelineError> {
        match frame.channels() {
            4 => Ok(Self { frame }),
            3 => {
                let (w, h) = frame.dimensions();
                let mut rgba = Vec::with_capacity(w as usize * h as usize * 4);
                for px in frame.data().chunks_exact(3) {
                    rgba.extend_from_slice(px);
                    rgba.push(u8::MAX);
                }
                Ok(Self {
                    frame: Frame::new(rgba, w, h, 4, 0),
                })
            }
            n => Err(PipelineError::Io(format!(
                "product image must have 3 or 4 channels, got {n}"
            ))),
        }
    }

    pub fn width(&self) -> u32 {
        self.frame.width()
    }

    pub fn height(&self) -> u32 {
        self.frame.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    pub fn as_frame(&self) -> &Frame {
        &self.frame
    }

    /// Raw opacity at pixel `(x, y)`; 0 is fully transparent. `None` outside
    /// the image.
    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let idx = (y as usize * self.width() as usize + x as usize) * 4 + 3;
        self.frame.data().get(idx).copied()
    }

    /// Smallest rectangle `(x, y, width, height)` containing every pixel with
    /// non-zero opacity, or `None` for a fully transparent image.
    pub fn coverage_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let w = self.width();
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        let mut any = false;

        for (i, px) in self.frame.data().chunks_exact(4).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let x = (i % w as usize) as u32;
            let y = (i / w as usize) as u32;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            any = true;
        }

        any.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}
