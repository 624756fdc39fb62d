//! Report assembly.
//!
//! [`build`] turns a finished [`GateRun`] into the three artifacts a caller
//! consumes: the machine report, the human summary, and the exit code.

use crate::finding::RunStatus;
use crate::gate::GateRun;
use crate::output::{self, OutputFormat};

/// Rendered outputs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Filtered diagnostics in the requested [`OutputFormat`].
    pub machine: String,
    /// Plain-text summary for a single review comment.
    pub human: String,
    pub exit_code: i32,
}

/// Builds the machine report, human summary, and exit code for `run`.
///
/// A no-op run renders an empty line-oriented report; JSON and SARIF still
/// produce a valid document with no results.
pub fn build(run: &GateRun, format: OutputFormat) -> Report {
    let machine = if run.status == RunStatus::NoOp && format == OutputFormat::Errorformat {
        String::new()
    } else {
        output::format_machine(run, format)
    };

    Report {
        machine,
        human: output::summary::format(run),
        exit_code: run.exit_code,
    }
}
