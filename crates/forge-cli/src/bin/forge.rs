//! forge CLI Binary
//!
//! Builds `./main` from `./main.bf` with the fixed toolchain:
//!
//! ```bash
//! bfc main.bf > main.ll
//! llc -O3 -filetype=obj -o main.o main.ll
//! ld -o main -dynamic-linker /lib64/ld-linux-x86-64.so.2 main.o flush_stdout.o -lc
//! ```
//!
//! The process exits with the status of the first tool that failed, `127`
//! if a tool could not be started, and `0` once the executable is linked.

use clap::{Parser, ValueEnum};
use forge_cli::{
    diagnostics::{render_cli_error, setup_error_reporting},
    BuildConfig, BuildPipeline, CliError, Result,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "forge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Builds ./main from ./main.bf through the external frontend, llc and ld"
)]
struct Cli {
    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_error_reporting().and_then(|_| {
        setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)
    }) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }

    let pipeline = BuildPipeline::new(BuildConfig::default());
    match pipeline.run() {
        Ok(report) => {
            info!(
                executable = %report.executable.display(),
                leftover = report.cleanup_failures.len(),
                "build succeeded"
            );
        }
        Err(e) => {
            let code = e.exit_code();
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            render_cli_error(e);
            std::process::exit(code);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs share stderr with forwarded tool output; stdout stays untouched.
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let result = match log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(formatter)
            .with(filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(formatter.json())
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| CliError::Config(format!("Failed to initialize logging: {}", e)))
}
