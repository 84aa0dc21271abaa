use std::fmt;

use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
///
/// Messages are flattened to strings at the port boundary so errors can move
/// between compositing worker threads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Missing, corrupt, or empty input.
    #[error("I/O error: {0}")]
    Io(String),
    #[error(
        "dimension mismatch: background is {}x{}, product image is {}x{}",
        background.0, background.1, product.0, product.1
    )]
    DimensionMismatch {
        background: (u32, u32),
        product: (u32, u32),
    },
    /// Encoder/decoder initialization or write failure.
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn io(context: impl fmt::Display, err: impl fmt::Display) -> Self {
        Self::Io(format!("{context}: {err}"))
    }

    pub fn encoding(context: impl fmt::Display, err: impl fmt::Display) -> Self {
        Self::Encoding(format!("{context}: {err}"))
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A step of the linear recomposite run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Extracting,
    Compositing,
    Assembling,
    Transcoding,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Extracting => "extract",
            Stage::Compositing => "composite",
            Stage::Assembling => "assemble",
            Stage::Transcoding => "transcode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by the orchestrator: the originating error, untouched,
/// plus the stage it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: PipelineError) -> Self {
        Self { stage, error }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error == PipelineError::Cancelled
    }
}
