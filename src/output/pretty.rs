//! Human-readable colored text formatter.
//!
//! Produces a terminal-friendly view of a run: the scripts that were
//! checked, retained findings with their source lines, tool failures,
//! warnings, and a one-line result.

use crate::finding::{RunStatus, Severity};
use crate::gate::GateRun;
use colored::Colorize;

/// Formats a [`GateRun`] as human-readable, ANSI-colored text.
///
/// Sections rendered (in order):
/// 1. **Scripts**: per-script linted/unchanged/failed status.
/// 2. **Findings**: retained findings with severity, rule, location, and source line.
/// 3. **Warnings**: non-fatal problems met during the run.
/// 4. **Result**: run status and severity counts.
pub fn format(run: &GateRun) -> String {
    let mut out = String::new();

    if run.status == RunStatus::NoOp {
        out.push_str(&format!(
            "{} no shell scripts among {} changed file(s)\n",
            "SKIP".dimmed(),
            run.files_in_diff
        ));
        return out;
    }

    out.push_str(&format!("{}\n", "Scripts".bold().underline()));
    for script in &run.scripts {
        let (icon, detail) = if let Some(failure) = run.lint.failures.get(&script.path) {
            ("FAIL".red().bold().to_string(), failure.to_string())
        } else if run.unchanged.contains(&script.path) {
            (
                "SKIP".dimmed().to_string(),
                "no added lines".dimmed().to_string(),
            )
        } else {
            let count = run
                .filter
                .retained
                .iter()
                .filter(|f| f.file == script.path)
                .count();
            ("LINT".green().bold().to_string(), format!("{count} finding(s)"))
        };
        out.push_str(&format!(
            "  [{icon}] {path:<40} {detail}\n",
            path = script.path
        ));
    }
    out.push('\n');

    if !run.filter.retained.is_empty() {
        out.push_str(&format!("{}\n", "Findings".bold().underline()));
        for finding in &run.filter.retained {
            let severity_str = match finding.severity {
                Severity::Error => "ERROR".red().bold().to_string(),
                Severity::Warning => " WARN".yellow().bold().to_string(),
                Severity::Info => " INFO".blue().to_string(),
                Severity::Style => "STYLE".cyan().to_string(),
            };
            out.push_str(&format!(
                "  [{severity_str}] {code:<8} {message}\n",
                code = finding.code.dimmed(),
                message = finding.message,
            ));
            out.push_str(&format!(
                "          {}\n",
                format!("{}:{}:{}", finding.file, finding.line, finding.column).dimmed()
            ));
            if let Some(ref source) = finding.source_line {
                out.push_str(&format!("          > {}\n", source.trim_end().dimmed()));
            }
        }
        out.push('\n');
    }

    if !run.warnings.is_empty() {
        out.push_str(&format!("{}\n", "Warnings".bold().underline()));
        for warning in &run.warnings {
            out.push_str(&format!("  {}\n", warning.to_string().yellow()));
        }
        out.push('\n');
    }

    let status_str = match run.status {
        RunStatus::Clean | RunStatus::Passed => run.status.to_string().green().bold().to_string(),
        RunStatus::Partial => run.status.to_string().yellow().bold().to_string(),
        RunStatus::Failed | RunStatus::Indeterminate => {
            run.status.to_string().red().bold().to_string()
        }
        RunStatus::NoOp => run.status.to_string().dimmed().to_string(),
    };

    let (errors, warnings, info, style) = run.filter.count_by_severity();
    out.push_str(&format!(
        "Result: {status_str}  |  {} on modified lines ({} before filtering)  |  {} errors, {} warnings, {} info, {} style\n",
        run.filter.total_after, run.filter.total_before, errors, warnings, info, style,
    ));

    out
}
