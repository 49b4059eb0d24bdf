//! Stage composition for the forge build pipeline.
//!
//! A pipeline is a chain of [`PipelineStage`]s built with
//! [`PipelineBuilder`]; each stage consumes the artifact produced by the one
//! before it. Runs are tracked against the [`PipelineState`] machine and the
//! first failing stage ends the run.

pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod state;

pub use diagnostics::{Diagnostic, DiagnosticLevel};
pub use error::{
    PipelineDiagnostics, PipelineError, PipelineErrorKind, ToolStatus, EXIT_FAILURE,
    EXIT_TOOL_UNAVAILABLE,
};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineStage};
pub use state::{PipelineState, StageTracker, TransitionError};
