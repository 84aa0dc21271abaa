use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::shared::error::PipelineError;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::encode_settings::EncodeSettings;

/// Re-encodes an assembled video into the delivery codec.
///
/// Implementations must preserve frame count and order, release every
/// decoder/encoder handle before returning, and leave no partial output
/// behind on failure. Failures are reported as [`PipelineError::Encoding`],
/// except a raised `cancelled` flag, which stops between frames with
/// [`PipelineError::Cancelled`].
pub trait Transcoder: Send {
    /// Returns the metadata of the written delivery file.
    fn transcode(
        &self,
        input: &Path,
        output: &Path,
        fps: f64,
        settings: &EncodeSettings,
        cancelled: &AtomicBool,
    ) -> Result<VideoMetadata, PipelineError>;
}
