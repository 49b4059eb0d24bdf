use std::fmt;
use thiserror::Error;

/// Lifecycle of a single pipeline run.
///
/// `Idle → Codegen → Assemble → Link → Done`, where any stage may move to
/// `Aborted` instead of advancing. `Done` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Codegen,
    Assemble,
    Link,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Codegen => "codegen",
            PipelineState::Assemble => "assemble",
            PipelineState::Link => "link",
            PipelineState::Done => "done",
            PipelineState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }

    /// The only state this one may advance to on success.
    pub fn successor(self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Codegen),
            PipelineState::Codegen => Some(PipelineState::Assemble),
            PipelineState::Assemble => Some(PipelineState::Link),
            PipelineState::Link => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Aborted => None,
        }
    }

    pub fn can_transition_to(self, next: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            // Aborting from Idle means nothing ran; still a valid failure.
            PipelineState::Aborted => true,
            _ => self.successor() == Some(next),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal pipeline transition {from} -> {to}")]
pub struct TransitionError {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Records every state a run passes through.
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<PipelineState>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self {
            history: vec![PipelineState::Idle],
        }
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineState) -> Result<(), TransitionError> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(TransitionError { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }

    pub fn abort(&mut self) {
        if !self.current().is_terminal() {
            self.history.push(PipelineState::Aborted);
        }
    }

    pub fn finish(&mut self) -> Result<(), TransitionError> {
        self.advance(PipelineState::Done)
    }
}
