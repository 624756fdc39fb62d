//! Plain-text human summary, suitable for posting as a single review comment.
//!
//! A no-op run (no shell scripts) renders as an empty string.

use crate::finding::RunStatus;
use crate::gate::GateRun;
use crate::output::errorformat;

pub fn format(run: &GateRun) -> String {
    if run.status == RunStatus::NoOp {
        return String::new();
    }

    let mut out = String::new();
    let filter = &run.filter;
    let blocking = filter.blocking_count();

    out.push_str(&format!("Shell lint on modified lines: {}\n", run.status));
    out.push_str(&format!(
        "{} issue(s) on modified lines ({} blocking at threshold '{}'), {} total before filtering, {} script(s) linted.\n",
        filter.total_after,
        blocking,
        filter.threshold,
        filter.total_before,
        run.files_linted(),
    ));

    if !filter.retained.is_empty() {
        out.push('\n');
        for finding in &filter.retained {
            out.push_str(&errorformat::format_finding(finding));
            out.push('\n');
            if let Some(source) = &finding.source_line {
                out.push_str(&format!("    > {}\n", source.trim_end()));
            }
        }
    }

    if !run.lint.failures.is_empty() {
        out.push_str("\nNot checked (lint tool failed):\n");
        for (path, failure) in &run.lint.failures {
            out.push_str(&format!("  {path}: {failure}\n"));
        }
    }

    if !run.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &run.warnings {
            out.push_str(&format!("  {warning}\n"));
        }
    }

    out
}
