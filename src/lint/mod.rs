//! Lint tool invocation.
//!
//! Every lint tool is wrapped in a [`Linter`]. [`run`] lints a set of
//! [`ShellScript`]s in parallel via [rayon] and merges the per-file results
//! into path-keyed maps, so the outcome does not depend on which worker
//! finishes first.
//!
//! A tool reporting problems is a normal result. A tool that cannot start,
//! times out, crashes, or exits with an unexpected status produces a
//! [`ToolFailure`] for that file instead; the other files are unaffected.

pub mod shellcheck;

use crate::classify::ShellScript;
use crate::error::ToolFailure;
use crate::finding::{Finding, Severity, Stage, Warning};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// A lint tool adapter.
///
/// Implementers **must** be [`Send`] + [`Sync`] because [`run`] lints files
/// in parallel.
///
/// # Implementing a custom linter
///
/// ```rust,ignore
/// use shell_diff_gate::lint::{Linter, ToolReport};
///
/// pub struct MyLinter;
///
/// impl Linter for MyLinter {
///     fn name(&self) -> &'static str { "my_linter" }
///     fn is_available(&self) -> bool { true }
///     fn lint(&self, script: &ShellScript, root: &Path) -> Result<ToolReport, ToolFailure> {
///         // ... run the tool, map its output ...
///         # todo!()
///     }
/// }
/// ```
pub trait Linter: Send + Sync {
    /// Identifier used as the rule-id prefix (e.g. `"shellcheck"`).
    fn name(&self) -> &'static str;

    /// Returns `true` if the tool can be executed.
    fn is_available(&self) -> bool;

    /// Lints one file. `script.path` is relative to `root`.
    fn lint(&self, script: &ShellScript, root: &Path) -> Result<ToolReport, ToolFailure>;
}

/// Parsed output of one tool invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ToolReport {
    pub findings: Vec<Finding>,
    /// Descriptions of output entries that did not match the expected schema.
    pub dropped: Vec<String>,
}

/// Merged result of linting every script.
#[derive(Debug, Default)]
pub struct LintOutcome {
    /// Findings per file. Files linted cleanly map to an empty list.
    pub findings: BTreeMap<String, Vec<Finding>>,
    /// Files for which the tool produced no verdict.
    pub failures: BTreeMap<String, ToolFailure>,
    pub warnings: Vec<Warning>,
}

impl LintOutcome {
    /// Number of files the tool was asked to lint.
    pub fn files_attempted(&self) -> usize {
        self.findings.len() + self.failures.len()
    }

    /// Total findings across all files.
    pub fn total_findings(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }
}

/// Maps a tool's native severity vocabulary onto [`Severity`].
///
/// Lookups are case-insensitive. A token absent from the table makes the
/// entry carrying it unparsable.
#[derive(Debug, Clone, Copy)]
pub struct SeverityTable {
    entries: &'static [(&'static str, Severity)],
}

impl SeverityTable {
    pub const fn new(entries: &'static [(&'static str, Severity)]) -> Self {
        SeverityTable { entries }
    }

    pub fn map(&self, token: &str) -> Option<Severity> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token.trim()))
            .map(|&(_, severity)| severity)
    }
}

/// Lints every script and merges the results by path.
///
/// `jobs` bounds the worker count; `0` uses rayon's global pool.
pub fn run(
    scripts: &BTreeSet<ShellScript>,
    root: &Path,
    linter: &dyn Linter,
    jobs: usize,
) -> LintOutcome {
    let scripts: Vec<&ShellScript> = scripts.iter().collect();

    let lint_all = || -> Vec<(String, Result<ToolReport, ToolFailure>)> {
        scripts
            .par_iter()
            .map(|script| {
                let start = Instant::now();
                let result = linter.lint(script, root);
                tracing::debug!(
                    file = %script.path,
                    ok = result.is_ok(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "lint finished"
                );
                (script.path.clone(), result)
            })
            .collect()
    };

    let results = if jobs > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(lint_all),
            Err(e) => {
                tracing::warn!(error = %e, "could not build lint thread pool; using global pool");
                lint_all()
            }
        }
    } else {
        lint_all()
    };

    let mut outcome = LintOutcome::default();
    for (path, result) in results {
        match result {
            Ok(report) => {
                for reason in report.dropped {
                    tracing::warn!(file = %path, "dropped malformed tool output: {reason}");
                    outcome.warnings.push(Warning::new(
                        Stage::Lint,
                        Some(path.as_str()),
                        format!("dropped malformed tool output: {reason}"),
                    ));
                }
                let mut findings = report.findings;
                attach_source_lines(&mut findings, &root.join(&path));
                outcome.findings.insert(path, findings);
            }
            Err(failure) => {
                tracing::warn!(file = %path, "{failure}");
                outcome.failures.insert(path, failure);
            }
        }
    }

    outcome
}

/// Fills [`Finding::source_line`] from the file on disk when possible.
fn attach_source_lines(findings: &mut [Finding], full_path: &Path) {
    if findings.is_empty() {
        return;
    }
    let Ok(content) = std::fs::read_to_string(full_path) else {
        return;
    };
    let lines: Vec<&str> = content.lines().collect();
    for finding in findings {
        if finding.source_line.is_none() {
            finding.source_line = finding
                .line
                .checked_sub(1)
                .and_then(|i| lines.get(i))
                .map(|l| l.to_string());
        }
    }
}

/// Captured result of a finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, or `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `cmd` to completion, killing it once `timeout` elapses.
///
/// Output is spooled to anonymous temp files rather than pipes so a chatty
/// tool cannot block on a full pipe while we poll for its exit.
pub fn run_with_timeout(
    cmd: &mut Command,
    tool: &str,
    timeout: Duration,
) -> Result<ToolOutput, ToolFailure> {
    let output_err = |e: std::io::Error| ToolFailure::Output {
        tool: tool.to_string(),
        message: e.to_string(),
    };

    let mut stdout_file = tempfile::tempfile().map_err(output_err)?;
    let mut stderr_file = tempfile::tempfile().map_err(output_err)?;

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone().map_err(output_err)?))
        .stderr(Stdio::from(stderr_file.try_clone().map_err(output_err)?))
        .spawn()
        .map_err(|e| ToolFailure::Spawn {
            tool: tool.to_string(),
            message: e.to_string(),
        })?;

    let start = Instant::now();
    let poll_interval = Duration::from_millis(20);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    terminate(&mut child);
                    return Err(ToolFailure::Timeout {
                        tool: tool.to_string(),
                        secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(poll_interval);
            }
            Err(e) => {
                terminate(&mut child);
                return Err(output_err(e));
            }
        }
    };

    Ok(ToolOutput {
        code: status.code(),
        stdout: read_spooled(&mut stdout_file).map_err(output_err)?,
        stderr: read_spooled(&mut stderr_file).map_err(output_err)?,
    })
}

/// Kills `child` and reaps it so no zombie is left behind.
pub fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn read_spooled(file: &mut std::fs::File) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Returns `true` if `cmd` can be executed.
///
/// A value containing a path separator is checked directly; a bare name is
/// searched on `PATH`. On Unix the file must also be executable.
pub fn which_exists(cmd: &str) -> bool {
    if cmd.contains('/') || cmd.contains('\\') {
        return is_executable(Path::new(cmd));
    }
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|dir| is_executable(&dir.join(cmd))))
        .unwrap_or(false)
}

fn is_executable(candidate: &Path) -> bool {
    if !candidate.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(candidate)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        true
    }
}
