//! Shell script linting via [ShellCheck](https://www.shellcheck.net/).
//!
//! # How it works
//!
//! 1. Runs `shellcheck --format=json1 --severity=style <file>` from the
//!    repository root, bounded by the configured timeout.
//! 2. Exit status `0` (clean) and `1` (issues found) are verdicts; any other
//!    status, a signal, or a spawn error is a [`ToolFailure`].
//! 3. Each entry of the `comments` array is mapped to a [`Finding`] through
//!    [`SHELLCHECK_SEVERITIES`]. Entries missing a field, carrying a zero
//!    code, or using an unknown level are dropped and reported.
//!
//! Findings are tagged `shellcheck/SC<code>` and link to the ShellCheck wiki
//! through their code.

use crate::classify::ShellScript;
use crate::config::LintConfig;
use crate::error::ToolFailure;
use crate::finding::{Finding, Severity};
use crate::lint::{run_with_timeout, which_exists, Linter, SeverityTable, ToolReport};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// ShellCheck's `json1` level vocabulary.
pub const SHELLCHECK_SEVERITIES: SeverityTable = SeverityTable::new(&[
    ("error", Severity::Error),
    ("warning", Severity::Warning),
    ("info", Severity::Info),
    ("style", Severity::Style),
]);

/// External linter wrapper for ShellCheck.
#[derive(Debug, Clone)]
pub struct ShellCheck {
    tool: String,
    timeout: Duration,
    exclude: Vec<String>,
    shell: Option<String>,
}

impl ShellCheck {
    pub fn from_config(config: &LintConfig) -> Self {
        ShellCheck {
            tool: config.tool.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            exclude: config.exclude.clone(),
            shell: config.shell.clone(),
        }
    }

    /// Path or name of the binary this wrapper runs.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    fn command(&self, script: &ShellScript, root: &Path) -> Command {
        let mut cmd = Command::new(&self.tool);
        cmd.current_dir(root)
            .arg("--format=json1")
            .arg("--severity=style");
        if !self.exclude.is_empty() {
            cmd.arg(format!("--exclude={}", self.exclude.join(",")));
        }
        if let Some(shell) = &self.shell {
            cmd.arg(format!("--shell={shell}"));
        }
        cmd.arg("--").arg(&script.path);
        cmd
    }
}

impl Default for ShellCheck {
    fn default() -> Self {
        ShellCheck::from_config(&LintConfig::default())
    }
}

impl Linter for ShellCheck {
    fn name(&self) -> &'static str {
        "shellcheck"
    }

    fn is_available(&self) -> bool {
        which_exists(&self.tool)
    }

    fn lint(&self, script: &ShellScript, root: &Path) -> Result<ToolReport, ToolFailure> {
        let output = run_with_timeout(&mut self.command(script, root), &self.tool, self.timeout)?;

        match output.code {
            Some(0) | Some(1) => {}
            Some(code) => {
                return Err(ToolFailure::ExitStatus {
                    tool: self.tool.clone(),
                    code,
                    stderr: output.stderr.trim().to_string(),
                })
            }
            None => {
                return Err(ToolFailure::Crashed {
                    tool: self.tool.clone(),
                })
            }
        }

        parse_json1(&output.stdout, &script.path).map_err(|message| ToolFailure::Output {
            tool: self.tool.clone(),
            message,
        })
    }
}

#[derive(serde::Deserialize)]
struct Json1Document {
    comments: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct Json1Comment {
    line: usize,
    column: usize,
    level: String,
    code: u64,
    message: String,
}

/// Parses ShellCheck `json1` output for the file at `path`.
///
/// Well-formed comments become findings; malformed ones are listed in
/// [`ToolReport::dropped`]. Empty output means no findings. Output that is
/// not a `json1` document at all is an error.
///
/// ```
/// use shell_diff_gate::lint::shellcheck::parse_json1;
///
/// let out = r#"{"comments":[{"file":"a.sh","line":3,"column":6,"level":"info",
///     "code":2086,"message":"Double quote to prevent globbing and word splitting."}]}"#;
/// let report = parse_json1(out, "a.sh").unwrap();
/// assert_eq!(report.findings[0].rule_id, "shellcheck/SC2086");
/// ```
pub fn parse_json1(stdout: &str, path: &str) -> Result<ToolReport, String> {
    let mut report = ToolReport::default();
    if stdout.trim().is_empty() {
        return Ok(report);
    }

    let document: Json1Document =
        serde_json::from_str(stdout).map_err(|e| format!("invalid json1 document: {e}"))?;

    for (index, value) in document.comments.into_iter().enumerate() {
        let comment: Json1Comment = match serde_json::from_value(value) {
            Ok(c) => c,
            Err(e) => {
                report.dropped.push(format!("comment #{index}: {e}"));
                continue;
            }
        };

        // Real codes are >= 1000 and lines are 1-based.
        if comment.code == 0 || comment.line == 0 {
            report.dropped.push(format!(
                "comment #{index}: invalid code {} or line {}",
                comment.code, comment.line
            ));
            continue;
        }

        let Some(severity) = SHELLCHECK_SEVERITIES.map(&comment.level) else {
            report
                .dropped
                .push(format!("comment #{index}: unknown level '{}'", comment.level));
            continue;
        };

        let code = format!("SC{}", comment.code);
        report.findings.push(Finding {
            file: path.to_string(),
            line: comment.line,
            column: comment.column.max(1),
            severity,
            rule_id: format!("shellcheck/{code}"),
            code,
            message: comment.message,
            source_line: None,
        });
    }

    Ok(report)
}

/// Wiki page explaining a ShellCheck code such as `SC2086`.
pub fn wiki_url(code: &str) -> String {
    format!("https://www.shellcheck.net/wiki/{code}")
}
