use super::{clear_output, invoke_tool};
use crate::config::BuildConfig;
use crate::pipeline::artifacts::{IrArtifact, SourceProgram};
use crate::pipeline::STAGE_CODEGEN;
use crate::toolchain::{CommandRunner, ToolInvocation};
use forge_pipeline::{
    PipelineDiagnostics, PipelineError, PipelineErrorKind, PipelineStage, PipelineState,
};
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Runs the frontend on the source program and stores its stdout as the IR
/// file. Nothing is written unless the frontend succeeds.
pub(crate) struct EmitIrStage {
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) config: Arc<BuildConfig>,
}

impl EmitIrStage {
    fn invocation(&self, source: &SourceProgram) -> ToolInvocation {
        ToolInvocation::new(&self.config.frontend.program)
            .args(&self.config.frontend.args)
            .arg(source.path())
    }
}

impl PipelineStage for EmitIrStage {
    type SrcCtx = SourceProgram;
    type DstCtx = IrArtifact;

    fn name(&self) -> &'static str {
        STAGE_CODEGEN
    }

    fn state(&self) -> PipelineState {
        PipelineState::Codegen
    }

    fn run(
        &self,
        source: SourceProgram,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<IrArtifact, PipelineError> {
        let ir_path = self.config.ir_path();
        clear_output(&ir_path, "IR file", STAGE_CODEGEN, PipelineErrorKind::Compilation)?;
        let output = invoke_tool(
            self.runner.as_ref(),
            STAGE_CODEGEN,
            &self.config.frontend,
            &self.invocation(&source),
            PipelineErrorKind::Compilation,
            diagnostics,
        )?;

        let write_failed = |err: std::io::Error| {
            PipelineError::compilation(
                STAGE_CODEGEN,
                format!("Failed to write IR file {}: {}", ir_path.display(), err),
            )
        };
        let mut file = File::create(&ir_path).map_err(write_failed)?;
        file.write_all(&output.stdout).map_err(write_failed)?;
        file.sync_all().map_err(write_failed)?;

        info!(
            source = %source.path().display(),
            ir = %ir_path.display(),
            bytes = output.stdout.len(),
            "emitted IR"
        );
        Ok(IrArtifact(ir_path))
    }
}
