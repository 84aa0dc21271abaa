pub mod constants;
pub mod error;
pub mod frame;
pub mod frame_sequence;
pub mod product_image;
pub mod video_metadata;
