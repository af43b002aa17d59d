use std::fmt;
use std::io;
use std::path::Path;

use crate::ShredscopeError;

#[derive(Debug)]
pub struct CliError {
    pub msg: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.msg.fmt(f)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Format a user friendly I/O error message with suggestions.
pub fn format_io_error(operation: &str, path: &Path, err: &io::Error) -> String {
    use io::ErrorKind::*;
    let suggestion = match err.kind() {
        NotFound => "Check that the file exists and the path is correct.",
        PermissionDenied => "Check permissions or run as a different user.",
        UnexpectedEof => "The log shrank after indexing. Re-run on a stable file.",
        WriteZero => "Disk may be full. Free up space and try again.",
        _ => "Check the path and permissions.",
    };
    format!(
        "Error {} '{}': {}. {}",
        operation,
        path.display(),
        err,
        suggestion
    )
}

/// Convert an I/O error into a CLI error with context.
pub fn io_cli_error(operation: &str, path: &Path, err: io::Error) -> CliError {
    CliError {
        msg: format_io_error(operation, path, &err),
        source: Some(Box::new(err)),
    }
}

/// Simple CLI error from string.
pub fn simple_cli_error(msg: &str) -> CliError {
    CliError {
        msg: msg.to_string(),
        source: None,
    }
}

/// Convert a library error into a CLI error with a hint.
pub fn shredscope_cli_error(context: &str, err: ShredscopeError) -> CliError {
    CliError {
        msg: format!("{}: {}", context, cli_hint(&err)),
        source: Some(Box::new(err)),
    }
}

/// Return an actionable hint for a library error variant.
pub fn cli_hint(err: &ShredscopeError) -> String {
    use crate::ShredscopeError::*;
    match err {
        Config(msg) => format!("{msg}. Invalid configuration."),
        UnknownBlock(id) => format!("Block {id} not found. Run with --list to see indexed blocks."),
        ProjectionMismatch { .. } => format!(
            "{err}. Use the same bucket width for timelines and readiness, or pass --on-mismatch drop."
        ),
        Io(io) => format!("{io}"),
        Export(msg) => format!("{msg}. Could not write export."),
    }
}
