//! The build orchestrator: frontend, code generator and linker, in that
//! order, with cleanup of intermediates only after all three succeed.

mod artifacts;
mod stages;

pub use artifacts::{Executable, IrArtifact, ObjectArtifact, SourceProgram};

use crate::config::BuildConfig;
use crate::toolchain::{CommandRunner, SystemCommandRunner};
use crate::{CliError, Result};
use forge_pipeline::{
    Pipeline, PipelineBuilder, PipelineDiagnostics, PipelineState, StageTracker, TransitionError,
};
use stages::{AssembleStage, EmitIrStage, LinkStage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, info_span};

pub const STAGE_CODEGEN: &str = "codegen";
pub const STAGE_ASSEMBLE: &str = "assemble";
pub const STAGE_LINK: &str = "link";

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub executable: PathBuf,
    /// Every state the run passed through, from `Idle` to `Done`.
    pub states: Vec<PipelineState>,
    /// Intermediates that could not be removed. Never fails the build.
    pub cleanup_failures: Vec<PathBuf>,
}

pub struct BuildPipeline {
    config: Arc<BuildConfig>,
    runner: Arc<dyn CommandRunner>,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_runner(config, Arc::new(SystemCommandRunner))
    }

    pub fn with_runner(config: BuildConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: Arc::new(config),
            runner,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs the build, forwarding tool stderr to this process's stderr.
    pub fn run(&self) -> Result<BuildReport> {
        let mut diagnostics = PipelineDiagnostics::default();
        let mut tracker = StageTracker::new();
        self.run_with(&mut diagnostics, &mut tracker)
    }

    /// Runs the build with caller-provided diagnostics and tracker. The
    /// tracker must be fresh; a tracker from an earlier run is rejected
    /// before anything touches the disk.
    pub fn run_with(
        &self,
        diagnostics: &mut PipelineDiagnostics,
        tracker: &mut StageTracker,
    ) -> Result<BuildReport> {
        if tracker.current() != PipelineState::Idle {
            return Err(CliError::Assembly(TransitionError {
                from: tracker.current(),
                to: PipelineState::Codegen,
            }));
        }
        self.prepare_directories()?;
        let pipeline = self.assemble_pipeline()?;
        let source = SourceProgram(self.config.source_path());
        debug!(source = %source.path().display(), "starting build");

        let executable = pipeline.run(source, diagnostics, tracker)?;
        let cleanup_failures = self.cleanup(&executable);
        tracker.finish()?;

        info!(executable = %executable.path.display(), "build finished");
        Ok(BuildReport {
            executable: executable.path,
            states: tracker.history().to_vec(),
            cleanup_failures,
        })
    }

    fn assemble_pipeline(&self) -> Result<Pipeline<SourceProgram, Executable>> {
        let pipeline = PipelineBuilder::<SourceProgram, SourceProgram>::new()
            .add_stage(EmitIrStage {
                runner: Arc::clone(&self.runner),
                config: Arc::clone(&self.config),
            })
            .add_stage(AssembleStage {
                runner: Arc::clone(&self.runner),
                config: Arc::clone(&self.config),
            })
            .add_stage(LinkStage {
                runner: Arc::clone(&self.runner),
                config: Arc::clone(&self.config),
            })
            .build()?;
        Ok(pipeline)
    }

    fn prepare_directories(&self) -> Result<()> {
        let outputs = [
            self.config.ir_path(),
            self.config.object_path(),
            self.config.executable_path(),
        ];
        for parent in outputs.iter().filter_map(|path| path.parent()) {
            if parent == Path::new("") || parent.is_dir() {
                continue;
            }
            fs::create_dir_all(parent).map_err(|e| {
                CliError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {}", parent.display(), e),
                ))
            })?;
        }
        Ok(())
    }

    fn cleanup(&self, executable: &Executable) -> Vec<PathBuf> {
        if self.config.save_intermediates {
            debug!("keeping intermediate artifacts");
            return Vec::new();
        }
        let span = info_span!("pipeline.cleanup");
        let _enter = span.enter();
        artifacts::remove_intermediates(&executable.intermediates)
    }
}
