//! Deterministic recompositing of a product cut-out onto a generated video.
//!
//! The pipeline decodes the generated video into an on-disk frame sequence,
//! blends the original product pixels back over every frame, reassembles the
//! frames with a fast intermediate codec, and transcodes the result into a
//! broadly playable delivery codec.

pub mod compositing;
pub mod pipeline;
pub mod shared;
pub mod video;
