use crate::shared::constants::{DEFAULT_BITRATE, INTERMEDIATE_BITS_PER_PIXEL, MAX_BITRATE};

/// Video codecs the pipeline knows how to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2. Fast to encode, used for the intermediate artifact.
    Mpeg4,
    /// H.264. Slower, but plays nearly everywhere; the delivery codec.
    H264,
}

impl VideoCodec {
    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::H264 => "h264",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mpeg4" | "mp4v" => Some(VideoCodec::Mpeg4),
            "h264" | "libx264" | "avc" => Some(VideoCodec::H264),
            _ => None,
        }
    }
}

/// Encoder parameters for a [`VideoWriter`](super::video_writer::VideoWriter).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    pub codec: VideoCodec,
    /// Target bitrate in bits/s; `None` scales it with the pixel rate.
    pub bitrate: Option<usize>,
    /// Single-threaded encoding so repeated runs emit identical bytes.
    pub deterministic: bool,
}

impl EncodeSettings {
    /// Fast intermediate encoding used by the assembler.
    pub fn intermediate() -> Self {
        Self {
            codec: VideoCodec::Mpeg4,
            bitrate: None,
            deterministic: false,
        }
    }

    /// Bitrate for a `width`x`height` stream at `fps`. The encoder default
    /// (200 kbit/s in libavcodec) is never used: unset bitrates get
    /// [`INTERMEDIATE_BITS_PER_PIXEL`] per pixel per frame.
    pub fn bitrate_for(&self, width: u32, height: u32, fps: f64) -> usize {
        match self.bitrate {
            Some(bitrate) => bitrate,
            None => {
                let scaled = INTERMEDIATE_BITS_PER_PIXEL * width as f64 * height as f64 * fps;
                scaled.clamp(0.0, MAX_BITRATE as f64) as usize
            }
        }
    }

    /// Broadly compatible delivery encoding used by the transcoder.
    pub fn delivery() -> Self {
        Self {
            codec: VideoCodec::H264,
            bitrate: Some(DEFAULT_BITRATE),
            deterministic: false,
        }
    }
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::intermediate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mpeg4", Some(VideoCodec::Mpeg4))]
    #[case("mp4v", Some(VideoCodec::Mpeg4))]
    #[case("H264", Some(VideoCodec::H264))]
    #[case("libx264", Some(VideoCodec::H264))]
    #[case("vp9", None)]
    fn test_parse(#[case] name: &str, #[case] expected: Option<VideoCodec>) {
        assert_eq!(VideoCodec::parse(name), expected);
    }

    #[test]
    fn test_name_roundtrips_through_parse() {
        for codec in [VideoCodec::Mpeg4, VideoCodec::H264] {
            assert_eq!(VideoCodec::parse(codec.name()), Some(codec));
        }
    }

    #[rstest]
    #[case(1280, 720, 24.0, 88_473_600)]
    #[case(96, 64, 24.0, 589_824)]
    #[case(7680, 4320, 120.0, MAX_BITRATE)]
    fn test_intermediate_bitrate_scales_with_pixel_rate(
        #[case] width: u32,
        #[case] height: u32,
        #[case] fps: f64,
        #[case] expected: usize,
    ) {
        assert_eq!(EncodeSettings::intermediate().bitrate_for(width, height, fps), expected);
    }

    #[test]
    fn test_fixed_bitrate_is_kept() {
        assert_eq!(
            EncodeSettings::delivery().bitrate_for(1280, 720, 24.0),
            DEFAULT_BITRATE
        );
    }

    #[test]
    fn test_presets() {
        assert_eq!(EncodeSettings::intermediate().codec, VideoCodec::Mpeg4);
        assert_eq!(EncodeSettings::delivery().codec, VideoCodec::H264);
        assert_eq!(EncodeSettings::delivery().bitrate, Some(DEFAULT_BITRATE));
        assert_eq!(EncodeSettings::default(), EncodeSettings::intermediate());
    }
}
