use crate::shared::error::Stage;

/// Where a recomposite run currently is.
///
/// Transitions only move forward along
/// `Idle → Extracting → Compositing → Assembling → Transcoding → Done`;
/// `Failed` is reachable from every working state and, like `Done`, is
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Compositing,
    Assembling,
    Transcoding,
    Done,
    Failed(Stage),
}

impl PipelineState {
    /// The state after `self` completes successfully, or `None` if terminal.
    pub fn next(self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Extracting),
            PipelineState::Extracting => Some(PipelineState::Compositing),
            PipelineState::Compositing => Some(PipelineState::Assembling),
            PipelineState::Assembling => Some(PipelineState::Transcoding),
            PipelineState::Transcoding => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }

    /// The stage being worked on, if any.
    pub fn stage(self) -> Option<Stage> {
        match self {
            PipelineState::Extracting => Some(Stage::Extracting),
            PipelineState::Compositing => Some(Stage::Compositing),
            PipelineState::Assembling => Some(Stage::Assembling),
            PipelineState::Transcoding => Some(Stage::Transcoding),
            PipelineState::Idle | PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }

    /// Moves to the next working state. Panics in debug builds when called
    /// on a terminal state.
    pub fn advance(&mut self) {
        debug_assert!(!self.is_terminal(), "cannot advance from {self:?}");
        if let Some(next) = self.next() {
            *self = next;
        }
    }

    /// Marks the current stage as failed. No-op on terminal states.
    pub fn fail(&mut self) {
        if let Some(stage) = self.stage() {
            *self = PipelineState::Failed(stage);
        }
    }
}
