//! Report rendering.
//!
//! The machine report comes in three formats:
//!
//! | Format | Module | Use case |
//! |--------|--------|----------|
//! | [`Errorformat`](OutputFormat::Errorformat) | [`errorformat`] | Inline annotation tools (one line per finding) |
//! | [`Json`](OutputFormat::Json) | [`json`] | Automation / scripting |
//! | [`Sarif`](OutputFormat::Sarif) | [`sarif`] | CI code-scanning upload |
//!
//! The human summary is rendered by [`summary`] (plain text, suitable for a
//! review comment) or [`pretty`] (ANSI-colored, for a terminal).

pub mod errorformat;
pub mod json;
pub mod pretty;
pub mod sarif;
pub mod summary;

use crate::gate::GateRun;

/// Supported machine report formats.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `path:line:col: severity code: message [rule]`, one finding per line.
    #[default]
    Errorformat,
    /// Machine-readable JSON of the whole run.
    Json,
    /// [SARIF 2.1.0](https://sarifweb.azurewebsites.net/) for CI/CD tool integration.
    Sarif,
}

/// Renders the machine report for `run` in the requested format.
pub fn format_machine(run: &GateRun, format: OutputFormat) -> String {
    match format {
        OutputFormat::Errorformat => errorformat::format(&run.filter.retained),
        OutputFormat::Json => json::format(run),
        OutputFormat::Sarif => sarif::format(run),
    }
}
