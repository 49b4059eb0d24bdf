//! Integration tests for the forge binary, using shell-script stand-ins for
//! the frontend, code generator and linker placed on `PATH`.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FRONTEND: &str = r#"#!/bin/sh
printf 'bfc: note: 1 loop folded\n' >&2
printf '; ModuleID = main\ndefine void @_start() {\n  ret void\n}\n'
"#;

const REJECTING_FRONTEND: &str = r#"#!/bin/sh
printf 'main.bf:1:3: error: unmatched ]\n' >&2
exit 3
"#;

// Writes something to whatever follows `-o`.
const CODE_GENERATOR: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'OBJ' > "$out"
"#;

// Fails like ld when an object input is missing.
const LINKER: &str = r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    *.o)
      if [ ! -f "$arg" ]; then
        printf 'ld: cannot find %s: No such file or directory\n' "$arg" >&2
        exit 1
      fi
      ;;
  esac
done
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf 'EXE' > "$out"
"#;

const FAILING_LINKER: &str = r#"#!/bin/sh
printf "ld: main.o: undefined reference to \`flush_stdout'\n" >&2
exit 1
"#;

struct Sandbox {
    dir: TempDir,
    bin: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(dir.path().join("main.bf"), "++++++++[>++++<-]>.").unwrap();
        fs::write(dir.path().join("flush_stdout.o"), b"\x7fELF helper").unwrap();
        Self { dir, bin }
    }

    fn tool(self, name: &str, script: &str) -> Self {
        let path = self.bin.join(name);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    fn with_default_tools(self) -> Self {
        self.tool("bfc", FRONTEND)
            .tool("llc", CODE_GENERATOR)
            .tool("ld", LINKER)
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn forge(&self) -> Command {
        let mut cmd = Command::cargo_bin("forge").unwrap();
        cmd.current_dir(self.root())
            .env("PATH", &self.bin)
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("forge").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("main.bf"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("forge").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_rejects_positional_arguments() {
    let sandbox = Sandbox::new().with_default_tools();
    sandbox.forge().arg("other.bf").assert().failure();
    assert!(!sandbox.path("main").exists());
}

#[test]
fn test_build_success_leaves_only_executable() {
    let sandbox = Sandbox::new().with_default_tools();

    sandbox
        .forge()
        .assert()
        .success()
        .stderr(predicate::str::contains("bfc: note: 1 loop folded\n"));

    assert_eq!(fs::read(sandbox.path("main")).unwrap(), b"EXE");
    assert!(!sandbox.path("main.ll").exists());
    assert!(!sandbox.path("main.o").exists());
    assert!(sandbox.path("flush_stdout.o").exists());
}

#[test]
fn test_frontend_rejection_exit_code_and_passthrough() {
    let sandbox = Sandbox::new()
        .with_default_tools()
        .tool("bfc", REJECTING_FRONTEND);

    sandbox
        .forge()
        .assert()
        .code(3)
        .stderr(predicate::str::contains("main.bf:1:3: error: unmatched ]\n"))
        .stderr(predicate::str::contains("CompilationError"));

    assert!(!sandbox.path("main.ll").exists());
    assert!(!sandbox.path("main.o").exists());
    assert!(!sandbox.path("main").exists());
}

#[test]
fn test_missing_helper_is_link_error_and_keeps_intermediates() {
    let sandbox = Sandbox::new().with_default_tools();
    fs::remove_file(sandbox.path("flush_stdout.o")).unwrap();

    sandbox
        .forge()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("LinkError"));

    assert!(sandbox.path("main.ll").exists());
    assert!(sandbox.path("main.o").exists());
    assert!(!sandbox.path("main").exists());
}

#[test]
fn test_unresolved_symbol_reports_linker_status() {
    let sandbox = Sandbox::new()
        .with_default_tools()
        .tool("ld", FAILING_LINKER);

    sandbox
        .forge()
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "ld: main.o: undefined reference to `flush_stdout'\n",
        ));

    assert!(sandbox.path("main.ll").exists());
    assert!(sandbox.path("main.o").exists());
}

#[test]
fn test_missing_tool_uses_reserved_exit_code() {
    let sandbox = Sandbox::new()
        .tool("bfc", FRONTEND)
        .tool("llc", CODE_GENERATOR);

    sandbox
        .forge()
        .assert()
        .code(127)
        .stderr(predicate::str::contains("ToolInvocationError"));

    assert!(sandbox.path("main.o").exists());
}

#[test]
fn test_rebuild_is_deterministic() {
    let sandbox = Sandbox::new().with_default_tools();

    sandbox.forge().assert().success();
    let first = fs::read(sandbox.path("main")).unwrap();
    sandbox.forge().assert().success();
    let second = fs::read(sandbox.path("main")).unwrap();

    assert_eq!(first, second);
}
