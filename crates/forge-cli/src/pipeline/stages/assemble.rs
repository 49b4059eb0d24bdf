use super::{clear_output, invoke_tool, require_input, sync_artifact};
use crate::config::BuildConfig;
use crate::pipeline::artifacts::{IrArtifact, ObjectArtifact};
use crate::pipeline::STAGE_ASSEMBLE;
use crate::toolchain::{CommandRunner, ToolInvocation};
use forge_pipeline::{
    PipelineDiagnostics, PipelineError, PipelineErrorKind, PipelineStage, PipelineState,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Lowers the IR file to a relocatable object with the code generator.
pub(crate) struct AssembleStage {
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) config: Arc<BuildConfig>,
}

impl AssembleStage {
    fn invocation(&self, ir: &IrArtifact, obj_path: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.config.code_generator.program)
            .args(&self.config.code_generator.args)
            .arg(self.config.opt_level.as_flag())
            .arg("-filetype=obj")
            .arg("-o")
            .arg(obj_path)
            .arg(ir.path())
    }
}

impl PipelineStage for AssembleStage {
    type SrcCtx = IrArtifact;
    type DstCtx = ObjectArtifact;

    fn name(&self) -> &'static str {
        STAGE_ASSEMBLE
    }

    fn state(&self) -> PipelineState {
        PipelineState::Assemble
    }

    fn run(
        &self,
        ir: IrArtifact,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<ObjectArtifact, PipelineError> {
        require_input(
            ir.path(),
            "IR file",
            STAGE_ASSEMBLE,
            PipelineErrorKind::Compilation,
        )?;

        let obj_path = self.config.object_path();
        clear_output(
            &obj_path,
            "object file",
            STAGE_ASSEMBLE,
            PipelineErrorKind::Compilation,
        )?;
        invoke_tool(
            self.runner.as_ref(),
            STAGE_ASSEMBLE,
            &self.config.code_generator,
            &self.invocation(&ir, &obj_path),
            PipelineErrorKind::Compilation,
            diagnostics,
        )?;
        sync_artifact(
            &obj_path,
            "object file",
            STAGE_ASSEMBLE,
            PipelineErrorKind::Compilation,
        )?;

        info!(
            ir = %ir.path().display(),
            object = %obj_path.display(),
            opt_level = self.config.opt_level.as_flag(),
            "assembled object"
        );
        Ok(ObjectArtifact { path: obj_path, ir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::stages::testing::{fail, ok, FakeRunner};
    use forge_pipeline::ToolStatus;
    use std::ffi::OsString;
    use tempfile::TempDir;

    fn stage(dir: &TempDir, runner: &Arc<FakeRunner>) -> AssembleStage {
        AssembleStage {
            runner: runner.clone(),
            config: Arc::new(BuildConfig::default().with_work_dir(dir.path())),
        }
    }

    fn write_ir(dir: &TempDir) -> IrArtifact {
        let path = dir.path().join("main.ll");
        std::fs::write(&path, "define i32 @main() {\n  ret i32 0\n}\n").unwrap();
        IrArtifact(path)
    }

    #[test]
    fn requests_object_output_at_o3() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(FakeRunner::new().on("llc", ok(b"")));
        let ir = write_ir(&dir);

        let mut diagnostics = PipelineDiagnostics::buffered();
        let object = stage(&dir, &runner).run(ir.clone(), &mut diagnostics).unwrap();

        assert_eq!(object.path, dir.path().join("main.o"));
        assert_eq!(object.ir, ir);
        assert!(object.path.is_file());

        let calls = runner.calls.lock().unwrap();
        let expected: Vec<OsString> = vec![
            "-O3".into(),
            "-filetype=obj".into(),
            "-o".into(),
            dir.path().join("main.o").into(),
            dir.path().join("main.ll").into(),
        ];
        assert_eq!(calls[0].args, expected);
        assert_eq!(calls[0].existing_inputs, vec![dir.path().join("main.ll")]);
    }

    #[test]
    fn does_not_run_without_ir() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(FakeRunner::new().on("llc", ok(b"")));

        let mut diagnostics = PipelineDiagnostics::buffered();
        let err = stage(&dir, &runner)
            .run(IrArtifact(dir.path().join("main.ll")), &mut diagnostics)
            .unwrap_err();

        assert_eq!(err.kind, PipelineErrorKind::Compilation);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn code_generator_failure_keeps_its_status() {
        let dir = TempDir::new().unwrap();
        let stderr = b"llc: main.ll:1:1: error: expected top-level entity\n";
        let runner = Arc::new(FakeRunner::new().on("llc", fail(1, stderr)));
        let ir = write_ir(&dir);

        let mut diagnostics = PipelineDiagnostics::buffered();
        let err = stage(&dir, &runner).run(ir, &mut diagnostics).unwrap_err();

        assert_eq!(err.kind, PipelineErrorKind::Compilation);
        assert_eq!(err.status, Some(ToolStatus::Exited(1)));
        assert!(!dir.path().join("main.o").exists());
    }
}
