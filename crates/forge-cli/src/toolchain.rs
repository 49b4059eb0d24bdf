//! The single process boundary shared by every stage.

use forge_pipeline::ToolStatus;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::debug;

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Human readable command line, for logs only.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// What a finished tool left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: ToolStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs a command to completion, capturing stdout, stderr and status.
///
/// `Err` means the process never started (not found, not executable);
/// a process that ran and failed is an `Ok` with a non-success status.
pub trait CommandRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;
}

/// Spawns real processes, resolving programs through `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        debug!(command = %invocation.command_line(), "spawning tool");
        let output = cmd.output()?;
        Ok(ToolOutput {
            status: tool_status(output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn tool_status(status: ExitStatus) -> ToolStatus {
    if let Some(code) = status.code() {
        return ToolStatus::Exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ToolStatus::Signaled(signal);
        }
    }
    ToolStatus::Exited(forge_pipeline::EXIT_FAILURE)
}
