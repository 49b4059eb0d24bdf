use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The caller's input program. Never modified or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProgram(pub PathBuf);

/// IR text written from the frontend's stdout. Removed after a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrArtifact(pub PathBuf);

/// Relocatable object from the code generator. Removed after a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectArtifact {
    pub path: PathBuf,
    /// Carried along so cleanup knows what to remove once linking succeeds.
    pub ir: IrArtifact,
}

/// The linked program. Belongs to the caller once the build returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executable {
    pub path: PathBuf,
    pub intermediates: Vec<PathBuf>,
}

impl SourceProgram {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl IrArtifact {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Removes intermediate files, returning the ones that could not be removed.
/// A file that is already gone counts as removed.
pub(crate) fn remove_intermediates(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut failures = Vec::new();
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "removed intermediate artifact"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "intermediate artifact already absent")
            }
            Err(err) => {
                warn!(
                    error = %err,
                    path = %path.display(),
                    "failed to remove intermediate artifact after linking"
                );
                failures.push(path.clone());
            }
        }
    }
    failures
}
