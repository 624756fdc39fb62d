//! JSON output formatter.
//!
//! Produces a pretty-printed JSON document with the run status, a severity
//! summary, retained findings, tool failures, and warnings.

use crate::classify::ShellScript;
use crate::error::ToolFailure;
use crate::finding::{Finding, RunStatus, Severity, Warning};
use crate::gate::GateRun;
use std::collections::BTreeMap;

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    tool: &'static str,
    version: &'static str,
    timestamp: &'a str,
    status: RunStatus,
    passed: bool,
    exit_code: i32,
    threshold: Severity,
    summary: Summary,
    scripts: Vec<&'a ShellScript>,
    findings: &'a [Finding],
    tool_failures: &'a BTreeMap<String, ToolFailure>,
    warnings: &'a [Warning],
}

#[derive(serde::Serialize)]
struct Summary {
    files_in_diff: usize,
    scripts: usize,
    files_linted: usize,
    total_before: usize,
    total_after: usize,
    blocking: usize,
    errors: usize,
    warnings: usize,
    info: usize,
    style: usize,
}

/// Formats a [`GateRun`] as pretty-printed JSON.
///
/// # Panics
///
/// Panics if the run cannot be serialized (should not happen with valid data).
pub fn format(run: &GateRun) -> String {
    let (errors, warnings, info, style) = run.filter.count_by_severity();
    let output = JsonOutput {
        tool: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: &run.timestamp,
        status: run.status,
        passed: run.exit_code == 0,
        exit_code: run.exit_code,
        threshold: run.filter.threshold,
        summary: Summary {
            files_in_diff: run.files_in_diff,
            scripts: run.scripts.len(),
            files_linted: run.files_linted(),
            total_before: run.filter.total_before,
            total_after: run.filter.total_after,
            blocking: run.filter.blocking_count(),
            errors,
            warnings,
            info,
            style,
        },
        scripts: run.scripts.iter().collect(),
        findings: &run.filter.retained,
        tool_failures: &run.lint.failures,
        warnings: &run.warnings,
    };

    serde_json::to_string_pretty(&output).expect("JSON serialization failed") + "\n"
}
