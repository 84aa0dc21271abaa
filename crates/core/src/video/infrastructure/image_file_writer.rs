use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a frame to a lossless image file using the `image` crate.
///
/// The format follows the path extension (PNG for frame sequences).
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = frame.dimensions();
        match frame.channels() {
            3 => image::RgbImage::from_raw(width, height, frame.data().to_vec())
                .ok_or("Failed to create image from frame data")?
                .save(path)?,
            4 => image::RgbaImage::from_raw(width, height, frame.data().to_vec())
                .ok_or("Failed to create image from frame data")?
                .save(path)?,
            n => return Err(format!("cannot write {n}-channel frame as image").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, pixel: &[u8]) -> Frame {
        let data = pixel.repeat((width * height) as usize);
        Frame::new(data, width, height, pixel.len() as u8, 0)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(100, 80, &[50, 100, 200]);
        ImageFileWriter::new().write(&path, &frame).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(50, 50, &[50, 100, 200]);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_rgba_frame_written_with_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let frame = make_frame(8, 8, &[1, 2, 3, 99]);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap();
        assert!(img.color().has_alpha());
        assert_eq!(img.to_rgba8().get_pixel(7, 7).0, [1, 2, 3, 99]);
    }

    #[test]
    fn test_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let writer = ImageFileWriter::new();
        writer.write(&path, &make_frame(4, 4, &[0, 0, 0])).unwrap();
        writer.write(&path, &make_frame(4, 4, &[255, 255, 255])).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_write_invalid_path_returns_error() {
        let frame = make_frame(10, 10, &[0, 0, 0]);
        assert!(ImageFileWriter::new()
            .write(Path::new("/nonexistent/dir/out.png"), &frame)
            .is_err());
    }
}
