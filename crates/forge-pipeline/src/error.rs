use crate::diagnostics::{Diagnostic, DiagnosticLevel};
use std::io::{self, Write};
use thiserror::Error;
use tracing::{error, info, warn};

/// Exit code reported when an external tool could not be started at all.
pub const EXIT_TOOL_UNAVAILABLE: i32 = 127;
/// Exit code reported for failures that did not come from a tool's own status.
pub const EXIT_FAILURE: i32 = 1;

/// How an external tool terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Exited(i32),
    Signaled(i32),
}

impl ToolStatus {
    pub fn success(self) -> bool {
        matches!(self, ToolStatus::Exited(0))
    }

    /// Shell-style exit code for this status (`128 + signal` for signals).
    pub fn exit_code(self) -> i32 {
        match self {
            ToolStatus::Exited(code) => code,
            ToolStatus::Signaled(signal) => 128 + signal,
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Exited(code) => write!(f, "exit status {}", code),
            ToolStatus::Signaled(signal) => write!(f, "terminated by signal {}", signal),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// The tool could not be located or launched.
    ToolInvocation,
    /// The frontend or code generator ran and reported failure.
    Compilation,
    /// The linker failed or one of its inputs is missing.
    Link,
}

impl PipelineErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineErrorKind::ToolInvocation => "ToolInvocationError",
            PipelineErrorKind::Compilation => "CompilationError",
            PipelineErrorKind::Link => "LinkError",
        }
    }
}

#[derive(Debug, Error)]
#[error("[{stage}] {}: {message}", .kind.as_str())]
pub struct PipelineError {
    pub stage: &'static str,
    pub kind: PipelineErrorKind,
    pub message: String,
    /// Termination status of the tool, when the tool actually ran.
    pub status: Option<ToolStatus>,
}

impl PipelineError {
    pub fn new(stage: &'static str, kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn tool_invocation(stage: &'static str, message: impl Into<String>) -> Self {
        Self::new(stage, PipelineErrorKind::ToolInvocation, message)
    }

    pub fn compilation(stage: &'static str, message: impl Into<String>) -> Self {
        Self::new(stage, PipelineErrorKind::Compilation, message)
    }

    pub fn link(stage: &'static str, message: impl Into<String>) -> Self {
        Self::new(stage, PipelineErrorKind::Link, message)
    }

    pub fn with_status(mut self, status: ToolStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Process exit code that represents this failure.
    pub fn exit_code(&self) -> i32 {
        match (self.kind, self.status) {
            (_, Some(status)) if !status.success() => status.exit_code(),
            (PipelineErrorKind::ToolInvocation, _) => EXIT_TOOL_UNAVAILABLE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Where raw tool output is forwarded.
#[derive(Debug, Default)]
pub enum DiagnosticSink {
    #[default]
    Stderr,
    Buffer(Vec<u8>),
}

impl DiagnosticSink {
    fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            DiagnosticSink::Stderr => {
                let mut stderr = io::stderr().lock();
                stderr.write_all(bytes)?;
                stderr.flush()
            }
            DiagnosticSink::Buffer(buffer) => {
                buffer.extend_from_slice(bytes);
                Ok(())
            }
        }
    }
}

/// Collects what stages report: orchestrator diagnostics plus the raw
/// stderr of each tool, which is forwarded byte-for-byte.
#[derive(Debug, Default)]
pub struct PipelineDiagnostics {
    pub items: Vec<Diagnostic>,
    pub tool_output: Vec<(&'static str, Vec<u8>)>,
    sink: DiagnosticSink,
}

impl PipelineDiagnostics {
    pub fn buffered() -> Self {
        Self {
            sink: DiagnosticSink::Buffer(Vec::new()),
            ..Self::default()
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn push_tool_output(&mut self, stage: &'static str, stderr: Vec<u8>) {
        if stderr.is_empty() {
            return;
        }
        self.tool_output.push((stage, stderr));
    }

    /// Bytes forwarded so far when the sink is a buffer.
    pub fn forwarded(&self) -> &[u8] {
        match &self.sink {
            DiagnosticSink::Buffer(buffer) => buffer,
            DiagnosticSink::Stderr => &[],
        }
    }

    pub fn emit_stage(&mut self, stage: &'static str) {
        for diag in self.items.drain(..) {
            let context = diag.source_context.as_deref().unwrap_or(stage);
            match diag.level {
                DiagnosticLevel::Error => error!(stage = context, "{}", diag),
                DiagnosticLevel::Warning => warn!(stage = context, "{}", diag),
                DiagnosticLevel::Info => info!(stage = context, "{}", diag),
            }
        }
        for (tool_stage, bytes) in std::mem::take(&mut self.tool_output) {
            if let Err(err) = self.sink.write_raw(&bytes) {
                warn!(stage = tool_stage, error = %err, "failed to forward tool diagnostics");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_prefers_tool_status() {
        let err = PipelineError::compilation("assemble", "llc failed")
            .with_status(ToolStatus::Exited(3));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn exit_code_for_unstartable_tool_is_reserved() {
        let err = PipelineError::tool_invocation("codegen", "bfc: not found");
        assert_eq!(err.exit_code(), EXIT_TOOL_UNAVAILABLE);
    }

    #[test]
    fn exit_code_for_missing_input_is_generic_failure() {
        let err = PipelineError::link("link", "missing helper object");
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn signal_maps_to_shell_convention() {
        assert_eq!(ToolStatus::Signaled(9).exit_code(), 137);
    }

    #[test]
    fn display_names_stage_and_kind() {
        let err = PipelineError::link("link", "undefined symbol: flush_stdout");
        assert_eq!(
            err.to_string(),
            "[link] LinkError: undefined symbol: flush_stdout"
        );
    }

    #[test]
    fn tool_output_is_forwarded_verbatim() {
        let mut diagnostics = PipelineDiagnostics::buffered();
        let raw = b"warning: \xff odd bytes\n".to_vec();
        diagnostics.push_tool_output("codegen", raw.clone());
        diagnostics.push_tool_output("codegen", Vec::new());
        diagnostics.emit_stage("codegen");
        assert_eq!(diagnostics.forwarded(), raw.as_slice());
        assert!(diagnostics.tool_output.is_empty());
    }
}
