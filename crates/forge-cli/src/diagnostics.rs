//! Diagnostic and error reporting utilities

use crate::{CliError, Result};

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Renders a failed build to stderr. Tool output has already been forwarded
/// verbatim by the time this runs; this only adds the summary.
pub fn render_cli_error(error: CliError) {
    eprintln!("{:?}", miette::Report::new(error));
}
