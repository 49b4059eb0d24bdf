use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE: &str = "main.bf";
pub const DEFAULT_IR: &str = "main.ll";
pub const DEFAULT_OBJECT: &str = "main.o";
pub const DEFAULT_HELPER_OBJECT: &str = "flush_stdout.o";
pub const DEFAULT_EXECUTABLE: &str = "main";
pub const DEFAULT_FRONTEND: &str = "bfc";
pub const DEFAULT_CODE_GENERATOR: &str = "llc";
pub const DEFAULT_LINKER: &str = "ld";
pub const DEFAULT_DYNAMIC_LINKER: &str = "/lib64/ld-linux-x86-64.so.2";

/// Optimization level handed to the code generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    O0,
    O1,
    O2,
    #[default]
    O3,
}

impl OptLevel {
    pub fn as_flag(self) -> &'static str {
        match self {
            OptLevel::O0 => "-O0",
            OptLevel::O1 => "-O1",
            OptLevel::O2 => "-O2",
            OptLevel::O3 => "-O3",
        }
    }
}

impl TryFrom<u8> for OptLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(OptLevel::O0),
            1 => Ok(OptLevel::O1),
            2 => Ok(OptLevel::O2),
            3 => Ok(OptLevel::O3),
            other => Err(format!("Invalid optimization level: {}", other)),
        }
    }
}

/// An external program plus any arguments placed before the ones the stage
/// adds itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ToolSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())
    }
}

/// Everything the orchestrator would otherwise look up from the environment.
///
/// The defaults are the fixed build: `main.bf` through `bfc`, `llc -O3` and
/// `ld` into `./main`. Relative artifact paths resolve against `work_dir`.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding the source, intermediates and executable.
    pub work_dir: PathBuf,
    pub source: PathBuf,
    pub ir: PathBuf,
    pub object: PathBuf,
    pub helper_object: PathBuf,
    pub executable: PathBuf,
    pub frontend: ToolSpec,
    pub code_generator: ToolSpec,
    pub opt_level: OptLevel,
    pub linker: ToolSpec,
    /// Interpreter recorded in the executable's program headers.
    pub dynamic_linker: String,
    /// Libraries passed to the linker as `-l<name>`.
    pub link_libraries: Vec<String>,
    /// Keep the IR and object after a successful build.
    pub save_intermediates: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            source: PathBuf::from(DEFAULT_SOURCE),
            ir: PathBuf::from(DEFAULT_IR),
            object: PathBuf::from(DEFAULT_OBJECT),
            helper_object: PathBuf::from(DEFAULT_HELPER_OBJECT),
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            frontend: ToolSpec::new(DEFAULT_FRONTEND),
            code_generator: ToolSpec::new(DEFAULT_CODE_GENERATOR),
            opt_level: OptLevel::default(),
            linker: ToolSpec::new(DEFAULT_LINKER),
            dynamic_linker: DEFAULT_DYNAMIC_LINKER.to_string(),
            link_libraries: vec!["c".to_string()],
            save_intermediates: false,
        }
    }
}

impl BuildConfig {
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_frontend(mut self, tool: ToolSpec) -> Self {
        self.frontend = tool;
        self
    }

    pub fn with_code_generator(mut self, tool: ToolSpec) -> Self {
        self.code_generator = tool;
        self
    }

    pub fn with_linker(mut self, tool: ToolSpec) -> Self {
        self.linker = tool;
        self
    }

    pub fn with_helper_object(mut self, path: impl Into<PathBuf>) -> Self {
        self.helper_object = path.into();
        self
    }

    pub fn with_save_intermediates(mut self, save: bool) -> Self {
        self.save_intermediates = save;
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source)
    }

    pub fn ir_path(&self) -> PathBuf {
        self.resolve(&self.ir)
    }

    pub fn object_path(&self) -> PathBuf {
        self.resolve(&self.object)
    }

    pub fn helper_object_path(&self) -> PathBuf {
        self.resolve(&self.helper_object)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.resolve(&self.executable)
    }
}
