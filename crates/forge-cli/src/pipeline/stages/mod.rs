// One module per stage; each wraps exactly one external tool. The helpers
// below are the parts they share: invoking a tool and checking artifacts.

pub(crate) mod assemble;
pub(crate) mod emit_ir;
pub(crate) mod link;

pub(crate) use assemble::AssembleStage;
pub(crate) use emit_ir::EmitIrStage;
pub(crate) use link::LinkStage;

use crate::config::ToolSpec;
use crate::toolchain::{CommandRunner, ToolInvocation, ToolOutput};
use forge_pipeline::{Diagnostic, PipelineDiagnostics, PipelineError, PipelineErrorKind};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Runs one tool and turns its outcome into a stage result. The tool's
/// stderr is queued for verbatim forwarding in every case.
pub(super) fn invoke_tool(
    runner: &dyn CommandRunner,
    stage: &'static str,
    tool: &ToolSpec,
    invocation: &ToolInvocation,
    failure: PipelineErrorKind,
    diagnostics: &mut PipelineDiagnostics,
) -> Result<ToolOutput, PipelineError> {
    debug!(command = %invocation.command_line(), "invoking {}", tool);
    let output = match runner.run(invocation) {
        Ok(output) => output,
        Err(err) => {
            let mut diag = Diagnostic::error(format!("Failed to invoke {}: {}", tool, err))
                .with_source_context(stage);
            if err.kind() == io::ErrorKind::NotFound {
                diag = diag.with_suggestion(format!(
                    "make sure `{}` is installed and on PATH",
                    tool.display_name()
                ));
            }
            diagnostics.push(diag);
            return Err(PipelineError::tool_invocation(
                stage,
                format!("failed to start {}: {}", tool, err),
            ));
        }
    };

    diagnostics.push_tool_output(stage, output.stderr.clone());

    if !output.success() {
        warn!(status = %output.status, "{} failed", tool);
        return Err(PipelineError::new(
            stage,
            failure,
            format!("{} failed with {}", tool, output.status),
        )
        .with_status(output.status));
    }

    Ok(output)
}

/// A stage never starts unless its input is present.
pub(super) fn require_input(
    path: &Path,
    what: &str,
    stage: &'static str,
    kind: PipelineErrorKind,
) -> Result<(), PipelineError> {
    if path.is_file() {
        return Ok(());
    }
    Err(PipelineError::new(
        stage,
        kind,
        format!("required {} '{}' does not exist", what, path.display()),
    ))
}

/// Removes an output left behind by an earlier run, so the check after the
/// tool only ever sees what this run produced.
pub(super) fn clear_output(
    path: &Path,
    what: &str,
    stage: &'static str,
    kind: PipelineErrorKind,
) -> Result<(), PipelineError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale {}", what);
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(PipelineError::new(
            stage,
            kind,
            format!("failed to remove stale {} '{}': {}", what, path.display(), err),
        )),
    }
}

/// Flushes an artifact written by a tool, so the next stage sees it on disk.
pub(super) fn sync_artifact(
    path: &Path,
    what: &str,
    stage: &'static str,
    kind: PipelineErrorKind,
) -> Result<(), PipelineError> {
    let file = File::open(path).map_err(|err| {
        PipelineError::new(
            stage,
            kind,
            format!("{} '{}' was not produced: {}", what, path.display(), err),
        )
    })?;
    file.sync_all().map_err(|err| {
        PipelineError::new(
            stage,
            kind,
            format!("failed to flush {} '{}': {}", what, path.display(), err),
        )
    })
}
