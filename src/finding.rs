use std::fmt;

/// Four-level severity taxonomy shared by every lint tool.
///
/// Variants are ordered from most to least severe, so `a <= b` reads as
/// "`a` is at least as severe as `b`".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Style,
}

impl Severity {
    /// Returns `true` when this severity is at or above `threshold`.
    ///
    /// ```
    /// use shell_diff_gate::finding::Severity;
    ///
    /// assert!(Severity::Error.is_blocking(Severity::Warning));
    /// assert!(!Severity::Style.is_blocking(Severity::Warning));
    /// ```
    pub fn is_blocking(self, threshold: Severity) -> bool {
        self <= threshold
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Style => write!(f, "style"),
        }
    }
}

/// One diagnostic reported by the lint tool.
///
/// `file` is the repository-relative path as it appears in the diff, so
/// findings can be matched against the modified-line map without any path
/// juggling downstream.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    /// Tool-native code, e.g. `SC2086`.
    pub code: String,
    /// Tool-qualified rule identifier, e.g. `shellcheck/SC2086`.
    pub rule_id: String,
    pub message: String,
    /// The offending source line, when it could be read.
    pub source_line: Option<String>,
}

/// A non-fatal problem encountered during a run.
///
/// Warnings never change the exit code; they are surfaced in the report so
/// a reviewer knows the result is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Warning {
    pub stage: Stage,
    pub file: Option<String>,
    pub message: String,
}

impl Warning {
    pub fn new(stage: Stage, file: Option<&str>, message: impl Into<String>) -> Self {
        Warning {
            stage,
            file: file.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "[{}] {}: {}", self.stage, file, self.message),
            None => write!(f, "[{}] {}", self.stage, self.message),
        }
    }
}

/// Pipeline stage that raised a [`Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Diff,
    Classify,
    Lint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Diff => write!(f, "diff"),
            Stage::Classify => write!(f, "classify"),
            Stage::Lint => write!(f, "lint"),
        }
    }
}

/// Output of the line filter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FilterResult {
    /// Findings across all files before filtering.
    pub total_before: usize,
    /// Findings retained after filtering; always `retained.len()`.
    pub total_after: usize,
    /// Retained findings ordered by diff file order, then line, then column.
    pub retained: Vec<Finding>,
    /// Lowest severity that counts as blocking for this run.
    pub threshold: Severity,
    /// `true` when no retained finding is blocking.
    pub passed: bool,
}

impl FilterResult {
    pub fn blocking_count(&self) -> usize {
        self.retained
            .iter()
            .filter(|f| f.severity.is_blocking(self.threshold))
            .count()
    }

    /// Count retained findings per severity in a single pass.
    ///
    /// Returns `(errors, warnings, info, style)`.
    pub fn count_by_severity(&self) -> (usize, usize, usize, usize) {
        self.retained
            .iter()
            .fold((0, 0, 0, 0), |(e, w, i, s), f| match f.severity {
                Severity::Error => (e + 1, w, i, s),
                Severity::Warning => (e, w + 1, i, s),
                Severity::Info => (e, w, i + 1, s),
                Severity::Style => (e, w, i, s + 1),
            })
    }
}

/// Overall verdict of a gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// No shell scripts among the changed files.
    #[serde(rename = "no-op")]
    NoOp,
    /// Shell scripts were linted and nothing was retained.
    Clean,
    /// Only non-blocking findings were retained.
    Passed,
    /// At least one blocking finding was retained.
    Failed,
    /// Some files could not be linted; the rest produced no blocking finding.
    Partial,
    /// The lint tool failed for every target file.
    Indeterminate,
}

impl RunStatus {
    /// Process exit code for this status.
    ///
    /// `fail_on_tool_error` promotes [`RunStatus::Partial`] to an error exit.
    pub fn exit_code(self, fail_on_tool_error: bool) -> i32 {
        match self {
            RunStatus::NoOp | RunStatus::Clean | RunStatus::Passed => 0,
            RunStatus::Partial if fail_on_tool_error => 2,
            RunStatus::Partial => 0,
            RunStatus::Failed => 1,
            RunStatus::Indeterminate => 2,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::NoOp => write!(f, "no-op"),
            RunStatus::Clean => write!(f, "clean"),
            RunStatus::Passed => write!(f, "passed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Partial => write!(f, "partial"),
            RunStatus::Indeterminate => write!(f, "indeterminate"),
        }
    }
}
