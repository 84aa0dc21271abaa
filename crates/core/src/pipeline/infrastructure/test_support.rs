//! Frame-sequence fixtures shared by the executor tests.

use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::frame_sequence::FrameSequence;
use crate::shared::product_image::ProductImage;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

pub const WIDTH: u32 = 8;
pub const HEIGHT: u32 = 6;

/// Writes `count` solid frames whose value is `index * 10`.
pub fn write_sequence(dir: &Path, count: usize) -> FrameSequence {
    let writer = ImageFileWriter::new();
    let mut seq = FrameSequence::empty(dir);
    for _ in 0..count {
        let (index, path) = seq.push_index().unwrap();
        let value = (index * 10) as u8;
        let frame = Frame::new(
            vec![value; (WIDTH * HEIGHT * 3) as usize],
            WIDTH,
            HEIGHT,
            3,
            index,
        );
        writer.write(&path, &frame).unwrap();
    }
    seq
}

/// Opaque white square over the left half; the right half is transparent.
pub fn half_covered_product(width: u32, height: u32) -> ProductImage {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            let alpha = if x < width / 2 { 255 } else { 0 };
            data.extend_from_slice(&[255, 255, 255, alpha]);
        }
    }
    ProductImage::from_frame(Frame::new(data, width, height, 4, 0)).unwrap()
}

/// `(left, right)` pixel values of the first row of `frame`.
pub fn left_right(frame: &Frame) -> (u8, u8) {
    let right = ((frame.width() - 1) * frame.channels() as u32) as usize;
    (frame.data()[0], frame.data()[right])
}
