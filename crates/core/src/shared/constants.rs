/// Canvas every upstream asset is normalized to before it reaches this crate.
pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

pub const DEFAULT_FPS: u32 = 24;

/// Delivery bitrate in bits per second (8 Mbit/s).
pub const DEFAULT_BITRATE: usize = 8_000_000;

/// Intermediate encode budget per pixel per frame when no fixed bitrate is
/// set. High enough that MPEG-4 stays near its finest quantizer, so restored
/// product pixels reach the delivery encode intact.
pub const INTERMEDIATE_BITS_PER_PIXEL: f64 = 4.0;

/// Upper bound on any derived bitrate; encoders store it as a 32-bit int.
pub const MAX_BITRATE: usize = (i32::MAX / 2) as usize;

/// Zero-padding width of frame indices; lexical and numeric order coincide.
pub const FRAME_INDEX_WIDTH: usize = 6;
pub const FRAME_FILE_PREFIX: &str = "frame_";
pub const FRAME_FILE_EXTENSION: &str = "png";

/// File name of the intermediate (fast codec) video inside a run directory.
pub const ASSEMBLED_VIDEO_NAME: &str = "assembled.mp4";

pub const WORK_DIR_PREFIX: &str = "product-reel-";

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "webp", "tiff", "tif"];
