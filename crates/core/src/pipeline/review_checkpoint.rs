use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::error::PipelineError;

/// Outcome of reviewing a generated video before it is recomposited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// Resume point between video generation and recompositing.
///
/// Generation writes a pending checkpoint naming its artifacts; a reviewer
/// (a person or an automated check) records a decision; the recomposite run
/// starts from the checkpoint only once it is approved. Stored as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewCheckpoint {
    /// Generated video to recomposite.
    pub video: PathBuf,
    /// Transparency-carrying product cut-out.
    pub product: PathBuf,
    /// Background-replaced still the video was generated from, if kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<PathBuf>,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ReviewCheckpoint {
    pub fn pending(video: impl Into<PathBuf>, product: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            product: product.into(),
            background: None,
            status: ReviewStatus::Pending,
            note: None,
        }
    }

    pub fn with_background(mut self, background: impl Into<PathBuf>) -> Self {
        self.background = Some(background.into());
        self
    }

    pub fn approve(&mut self, note: Option<String>) {
        self.status = ReviewStatus::Approved;
        self.note = note;
    }

    pub fn reject(&mut self, note: Option<String>) {
        self.status = ReviewStatus::Rejected;
        self.note = note;
    }

    /// Writes the checkpoint as JSON. Artifact paths are interpreted against
    /// the working directory and stored relative to the checkpoint file's
    /// directory when they live under it, absolute otherwise, so a
    /// load/save cycle never changes what they point at.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let base = absolute(path.parent().unwrap_or(Path::new("")))?;
        let stored = Self {
            video: relative_to(&base, &self.video)?,
            product: relative_to(&base, &self.product)?,
            background: self
                .background
                .as_deref()
                .map(|p| relative_to(&base, p))
                .transpose()?,
            ..self.clone()
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| PipelineError::io("cannot serialize checkpoint", e))?;
        std::fs::write(path, json)
            .map_err(|e| PipelineError::io(format!("cannot write {}", path.display()), e))?;
        log::debug!("Saved {:?} checkpoint to {}", self.status, path.display());
        Ok(())
    }

    /// Loads a checkpoint. Relative artifact paths are resolved against the
    /// checkpoint file's directory.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io(format!("cannot read {}", path.display()), e))?;
        let mut checkpoint: ReviewCheckpoint = serde_json::from_str(&json)
            .map_err(|e| PipelineError::io(format!("malformed checkpoint {}", path.display()), e))?;

        if let Some(base) = path.parent() {
            checkpoint.video = resolve(base, &checkpoint.video);
            checkpoint.product = resolve(base, &checkpoint.product);
            checkpoint.background = checkpoint.background.map(|p| resolve(base, &p));
        }
        Ok(checkpoint)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, PipelineError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| PipelineError::io("cannot resolve working directory", e))
}

fn relative_to(base: &Path, path: &Path) -> Result<PathBuf, PipelineError> {
    let path = absolute(path)?;
    Ok(match path.strip_prefix(base) {
        Ok(inside) => inside.to_path_buf(),
        Err(_) => path,
    })
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Decides whether a checkpoint may proceed to recompositing.
pub trait ReviewGate {
    fn review(&self, checkpoint: &ReviewCheckpoint) -> ReviewStatus;
}

/// Defers to the decision a reviewer recorded in the checkpoint file.
pub struct CheckpointReviewGate;

impl ReviewGate for CheckpointReviewGate {
    fn review(&self, checkpoint: &ReviewCheckpoint) -> ReviewStatus {
        checkpoint.status
    }
}

/// Approves everything except explicit rejections. For unattended runs
/// where no reviewer is in the loop.
pub struct AutoApproveGate;

impl ReviewGate for AutoApproveGate {
    fn review(&self, checkpoint: &ReviewCheckpoint) -> ReviewStatus {
        match checkpoint.status {
            ReviewStatus::Rejected => ReviewStatus::Rejected,
            ReviewStatus::Pending | ReviewStatus::Approved => {
                log::info!("Auto-approving {}", checkpoint.video.display());
                ReviewStatus::Approved
            }
        }
    }
}
