//! forge: drives an external frontend, code generator and linker to turn a
//! single source program into a native executable.
//!
//! The build is three stages run strictly in sequence by
//! [`pipeline::BuildPipeline`]; each stage wraps one tool invocation made
//! through [`toolchain::CommandRunner`].

pub mod config;
pub mod diagnostics;
pub mod pipeline;
pub mod toolchain;

pub use config::{BuildConfig, OptLevel, ToolSpec};
pub use pipeline::{BuildPipeline, BuildReport};

// CLI-specific error handling
pub mod error {
    use forge_pipeline::{PipelineError, TransitionError, EXIT_FAILURE};
    use miette::Diagnostic;
    use thiserror::Error;

    #[derive(Error, Debug, Diagnostic)]
    pub enum CliError {
        #[error(transparent)]
        #[diagnostic(
            code(forge::pipeline),
            help("intermediate artifacts were left in place for inspection")
        )]
        Pipeline(#[from] PipelineError),

        #[error("IO error: {0}")]
        #[diagnostic(code(forge::io))]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        #[diagnostic(code(forge::config))]
        Config(String),

        #[error("Pipeline assembly error: {0}")]
        #[diagnostic(code(forge::assembly))]
        Assembly(#[from] TransitionError),
    }

    impl CliError {
        /// Exit code for the process: the failing tool's own status when
        /// there is one.
        pub fn exit_code(&self) -> i32 {
            match self {
                CliError::Pipeline(err) => err.exit_code(),
                _ => EXIT_FAILURE,
            }
        }
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
