//! Gate orchestration.
//!
//! [`run_gate`] drives one run end to end: parse the diff, classify the
//! candidate files, lint the shell scripts that have modified lines, and
//! filter the findings down to those lines. Stages run in sequence; only the
//! lint stage fans out across files.

use crate::classify::{self, ShellScript};
use crate::config::Config;
use crate::diff;
use crate::filter;
use crate::finding::{FilterResult, RunStatus, Warning};
use crate::lint::{self, LintOutcome, Linter};
use std::collections::BTreeSet;
use std::path::Path;

/// Inputs supplied by the caller.
#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    /// Unified diff of the change under review.
    pub diff_text: &'a str,
    /// Changed files to consider. `None` uses every file the diff keeps.
    pub files: Option<Vec<String>>,
    /// Directory the diff paths are relative to.
    pub root: &'a Path,
}

/// Everything a run produced, ready for report rendering.
#[derive(Debug)]
pub struct GateRun {
    pub timestamp: String,
    /// Number of file blocks in the diff.
    pub files_in_diff: usize,
    /// Shell scripts detected among the candidates.
    pub scripts: BTreeSet<ShellScript>,
    /// Scripts not linted because the diff adds no lines to them.
    pub unchanged: Vec<String>,
    pub lint: LintOutcome,
    pub filter: FilterResult,
    pub warnings: Vec<Warning>,
    pub status: RunStatus,
    pub exit_code: i32,
}

impl GateRun {
    /// Number of files handed to the lint tool.
    pub fn files_linted(&self) -> usize {
        self.lint.files_attempted()
    }
}

/// Runs the full gate.
///
/// # Pipeline
///
/// 1. Parses the diff with [`diff::parse`] into per-file modified-line sets.
/// 2. Builds the candidate list, dropping files the diff deletes or marks
///    binary.
/// 3. Classifies candidates with [`classify::classify`].
/// 4. Lints scripts that have at least one modified line via [`lint::run`].
/// 5. Filters findings with [`filter::filter`] and derives the [`RunStatus`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use shell_diff_gate::config::Config;
/// use shell_diff_gate::gate::{run_gate, GateInput};
/// use shell_diff_gate::lint::shellcheck::ShellCheck;
///
/// let config = Config::load(None).unwrap();
/// let diff_text = std::fs::read_to_string("pr.diff").unwrap();
/// let input = GateInput { diff_text: &diff_text, files: None, root: Path::new(".") };
/// let run = run_gate(&input, &config, &ShellCheck::from_config(&config.lint));
///
/// std::process::exit(run.exit_code);
/// ```
pub fn run_gate(input: &GateInput<'_>, config: &Config, linter: &dyn Linter) -> GateRun {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let parsed = diff::parse(input.diff_text);
    let modified = parsed.modified_lines_with_context(config.gate.context_lines);
    let mut warnings = parsed.warnings.clone();

    let candidates: Vec<String> = match &input.files {
        Some(files) => files
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .filter(|f| parsed.get(f).map_or(true, |d| d.is_lintable()))
            .map(str::to_string)
            .collect(),
        None => parsed
            .files()
            .iter()
            .filter(|f| f.is_lintable())
            .map(|f| f.path().to_string())
            .collect(),
    };

    let classification = classify::classify(&candidates, input.root, &config.classify);
    warnings.extend(classification.warnings);
    let scripts = classification.scripts;

    let (to_lint, unchanged): (BTreeSet<ShellScript>, BTreeSet<ShellScript>) = scripts
        .iter()
        .cloned()
        .partition(|s| modified.get(&s.path).is_some_and(|lines| !lines.is_empty()));
    let unchanged: Vec<String> = unchanged.into_iter().map(|s| s.path).collect();
    for path in &unchanged {
        tracing::debug!(file = %path, "no modified lines; not linted");
    }

    let lint = if to_lint.is_empty() {
        LintOutcome::default()
    } else {
        lint::run(&to_lint, input.root, linter, config.lint.jobs)
    };
    warnings.extend(lint.warnings.iter().cloned());

    let filter = filter::filter(&lint.findings, &modified, config.gate.threshold);
    let status = compute_status(&scripts, &lint, &filter);
    let exit_code = status.exit_code(config.gate.fail_on_tool_error);

    tracing::info!(
        status = %status,
        scripts = scripts.len(),
        linted = lint.files_attempted(),
        failures = lint.failures.len(),
        before = filter.total_before,
        after = filter.total_after,
        "gate run complete"
    );

    GateRun {
        timestamp,
        files_in_diff: parsed.len(),
        scripts,
        unchanged,
        lint,
        filter,
        warnings,
        status,
        exit_code,
    }
}

fn compute_status(
    scripts: &BTreeSet<ShellScript>,
    lint: &LintOutcome,
    filter: &FilterResult,
) -> RunStatus {
    if scripts.is_empty() {
        return RunStatus::NoOp;
    }
    if !filter.passed {
        return RunStatus::Failed;
    }

    let attempted = lint.files_attempted();
    let failed = lint.failures.len();
    if attempted > 0 && failed == attempted {
        RunStatus::Indeterminate
    } else if failed > 0 {
        RunStatus::Partial
    } else if filter.total_after > 0 {
        RunStatus::Passed
    } else {
        RunStatus::Clean
    }
}
