use std::path::Path;

use crate::shared::frame::Frame;

/// Reads a still image into a [`Frame`], keeping its alpha channel if present.
pub trait ImageReader: Send + Sync {
    /// Returns an RGB (3-channel) or RGBA (4-channel) frame with index 0.
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
