use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::shared::constants::{FRAME_FILE_EXTENSION, FRAME_FILE_PREFIX, FRAME_INDEX_WIDTH};
use crate::shared::error::PipelineError;

/// Largest index representable with `FRAME_INDEX_WIDTH` digits.
const MAX_INDEX: usize = 10usize.pow(FRAME_INDEX_WIDTH as u32) - 1;

/// Ordered, contiguous run of frame files in one directory.
///
/// Frame `i` always lives at `path_for(i)` (`frame_000042.png`). Callers
/// iterate `indices()` rather than listing the directory, so ordering never
/// depends on how the filesystem sorts names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSequence {
    dir: PathBuf,
    len: usize,
}

impl FrameSequence {
    /// An empty sequence rooted at `dir`; frames are added with `push_index`.
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            len: 0,
        }
    }

    /// Discovers an existing sequence in `dir`.
    ///
    /// Files not matching the naming convention are ignored. Fails if no frame
    /// files exist or the indices are not exactly `0..N`.
    pub fn discover(dir: &Path) -> Result<Self, PipelineError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| PipelineError::io(format!("cannot read {}", dir.display()), e))?;

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry?;
            if let Some(index) = entry.file_name().to_str().and_then(parse_index) {
                indices.push(index);
            }
        }

        if indices.is_empty() {
            return Err(PipelineError::Io(format!(
                "no frames found in {}",
                dir.display()
            )));
        }

        indices.sort_unstable();
        if let Some(missing) = first_gap(&indices) {
            return Err(PipelineError::Io(format!(
                "frame sequence in {} is missing index {missing}",
                dir.display()
            )));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            len: indices.len(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn indices(&self) -> Range<usize> {
        0..self.len
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(file_name(index))
    }

    /// Reserves the next index and returns its path.
    pub fn push_index(&mut self) -> Result<(usize, PathBuf), PipelineError> {
        let index = self.len;
        if index > MAX_INDEX {
            return Err(PipelineError::Io(format!(
                "frame index {index} exceeds the {FRAME_INDEX_WIDTH}-digit naming limit"
            )));
        }
        self.len += 1;
        Ok((index, self.path_for(index)))
    }
}

/// `frame_000042.png` for index 42.
pub fn file_name(index: usize) -> String {
    format!("{FRAME_FILE_PREFIX}{index:0width$}.{FRAME_FILE_EXTENSION}", width = FRAME_INDEX_WIDTH)
}

/// Inverse of [`file_name`]; `None` for anything not following the convention.
pub fn parse_index(name: &str) -> Option<usize> {
    let digits = name
        .strip_prefix(FRAME_FILE_PREFIX)?
        .strip_suffix(FRAME_FILE_EXTENSION)?
        .strip_suffix('.')?;
    if digits.len() != FRAME_INDEX_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn first_gap(sorted: &[usize]) -> Option<usize> {
    sorted
        .iter()
        .enumerate()
        .find(|(expected, actual)| *expected != **actual)
        .map(|(expected, _)| expected)
}
