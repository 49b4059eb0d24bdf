use super::{clear_output, invoke_tool, require_input};
use crate::config::BuildConfig;
use crate::pipeline::artifacts::{Executable, ObjectArtifact};
use crate::pipeline::STAGE_LINK;
use crate::toolchain::{CommandRunner, ToolInvocation};
use forge_pipeline::{
    Diagnostic, PipelineDiagnostics, PipelineError, PipelineErrorKind, PipelineStage,
    PipelineState,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Links the generated object with the helper object and libc into the
/// executable, with an explicit dynamic interpreter.
pub(crate) struct LinkStage {
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) config: Arc<BuildConfig>,
}

impl LinkStage {
    fn invocation(
        &self,
        object: &ObjectArtifact,
        helper: &Path,
        binary_path: &Path,
    ) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.config.linker.program)
            .args(&self.config.linker.args)
            .arg("-o")
            .arg(binary_path)
            .arg("-dynamic-linker")
            .arg(&self.config.dynamic_linker)
            .arg(&object.path)
            .arg(helper);
        for lib in &self.config.link_libraries {
            invocation = invocation.arg(format!("-l{}", lib));
        }
        invocation
    }
}

impl PipelineStage for LinkStage {
    type SrcCtx = ObjectArtifact;
    type DstCtx = Executable;

    fn name(&self) -> &'static str {
        STAGE_LINK
    }

    fn state(&self) -> PipelineState {
        PipelineState::Link
    }

    fn run(
        &self,
        object: ObjectArtifact,
        diagnostics: &mut PipelineDiagnostics,
    ) -> Result<Executable, PipelineError> {
        require_input(&object.path, "object file", STAGE_LINK, PipelineErrorKind::Link)?;

        let helper = self.config.helper_object_path();
        let helper_present =
            require_input(&helper, "helper object", STAGE_LINK, PipelineErrorKind::Link);
        if let Err(err) = helper_present {
            diagnostics.push(
                Diagnostic::error(err.message.clone())
                    .with_source_context(STAGE_LINK)
                    .with_suggestion("the helper object is a build input and is never generated"),
            );
            return Err(err);
        }

        let binary_path = self.config.executable_path();
        clear_output(&binary_path, "executable", STAGE_LINK, PipelineErrorKind::Link)?;
        invoke_tool(
            self.runner.as_ref(),
            STAGE_LINK,
            &self.config.linker,
            &self.invocation(&object, &helper, &binary_path),
            PipelineErrorKind::Link,
            diagnostics,
        )?;
        require_input(&binary_path, "executable", STAGE_LINK, PipelineErrorKind::Link)?;

        info!(
            object = %object.path.display(),
            helper = %helper.display(),
            executable = %binary_path.display(),
            "linked executable"
        );
        Ok(Executable {
            path: binary_path,
            intermediates: vec![object.ir.0, object.path],
        })
    }
}
