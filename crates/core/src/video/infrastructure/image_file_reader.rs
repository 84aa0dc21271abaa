use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_reader::ImageReader;

/// Loads still images (frames on disk, the product cut-out) with the `image`
/// crate.
///
/// Images with an alpha channel decode to RGBA; everything else to RGB.
/// Higher bit depths are reduced to 8 bits per channel.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::open(path)?;
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(format!("{} has no pixels", path.display()).into());
        }

        let frame = if img.color().has_alpha() {
            Frame::new(img.into_rgba8().into_raw(), width, height, 4, 0)
        } else {
            Frame::new(img.into_rgb8().into_raw(), width, height, 3, 0)
        };
        Ok(frame)
    }
}
