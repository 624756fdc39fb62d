//! Error types.
//!
//! [`GateError`] covers the failures that stop a run before it starts
//! (configuration and input problems). [`ToolFailure`] describes a lint tool
//! that could not produce a verdict for one file; it travels inside
//! [`LintOutcome`](crate::lint::LintOutcome) as data rather than aborting
//! the run.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors for configuration loading and input reading.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Failed to read {what} from {source_name}: {source}")]
    Input {
        what: &'static str,
        source_name: String,
        source: std::io::Error,
    },
}

/// Result alias for operations that can fail with [`GateError`].
pub type Result<T> = std::result::Result<T, GateError>;

/// Why the external lint tool produced no usable verdict for a file.
///
/// This is distinct from "issues found": the tool reporting problems is a
/// normal outcome, a `ToolFailure` means the gate has no signal for the file.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolFailure {
    #[error("failed to start {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} timed out after {secs}s")]
    Timeout { tool: String, secs: u64 },

    #[error("{tool} was terminated without an exit status")]
    Crashed { tool: String },

    #[error("{tool} exited with status {code}: {stderr}")]
    ExitStatus {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to read {tool} output: {message}")]
    Output { tool: String, message: String },
}
