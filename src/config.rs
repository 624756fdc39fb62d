//! Configuration loading and management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then CLI flags (which also read `SHELL_DIFF_GATE_*` environment variables).
//!
//! # Configuration file
//!
//! The default configuration file is `shell-diff-gate.toml` in the current
//! working directory. Use [`Config::load`] to read it:
//!
//! ```rust,no_run
//! use shell_diff_gate::config::Config;
//!
//! let config = Config::load(None).expect("failed to load config");
//! assert_eq!(config.lint.tool, "shellcheck");
//! ```
//!
//! # Example
//!
//! ```toml
//! [lint]
//! tool = "/opt/shellcheck/bin/shellcheck"
//! timeout_secs = 20
//! exclude = ["SC1091"]
//!
//! [gate]
//! threshold = "error"
//!
//! [classify]
//! extensions = ["sh", "bash"]
//!
//! [output]
//! format = "sarif"
//! ```

use crate::error::{GateError, Result};
use crate::finding::Severity;
use crate::output::OutputFormat;
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "shell-diff-gate.toml";

/// Main configuration for a gate run.
///
/// All fields carry defaults so the config file can be omitted entirely.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    pub lint: LintConfig,
    pub gate: GateConfig,
    pub classify: ClassifyConfig,
    pub output: OutputConfig,
}

/// How the external lint tool is invoked.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct LintConfig {
    /// Binary name (looked up on `PATH`) or path to the lint tool.
    pub tool: String,
    /// Per-file wall-clock limit; a file exceeding it is a tool failure.
    pub timeout_secs: u64,
    /// Rule codes the tool should not report (e.g. `SC1091`).
    pub exclude: Vec<String>,
    /// Shell dialect override passed to the tool (`sh`, `bash`, ...).
    pub shell: Option<String>,
    /// Worker threads for per-file linting; `0` uses all cores.
    pub jobs: usize,
}

/// Pass/fail policy.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Lowest severity that fails the gate.
    pub threshold: Severity,
    /// Fail the run when the tool could not lint some of the files.
    pub fail_on_tool_error: bool,
    /// Context lines around an addition that also count as modified.
    /// `0` keeps strict added-line filtering.
    pub context_lines: usize,
}

/// Shell script detection.
///
/// Entries are normalized at load time via [`ClassifyConfig::normalize`]:
/// lowercase, no leading dot.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// File extensions treated as shell scripts.
    pub extensions: Vec<String>,
    /// Shebang interpreters treated as shells, for extensionless files.
    pub interpreters: Vec<String>,
}

/// Report rendering.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

impl Default for LintConfig {
    fn default() -> Self {
        LintConfig {
            tool: "shellcheck".to_string(),
            timeout_secs: 30,
            exclude: Vec::new(),
            shell: None,
            jobs: 0,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            threshold: Severity::Warning,
            fail_on_tool_error: false,
            context_lines: 0,
        }
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        ClassifyConfig {
            extensions: ["sh", "bash", "ksh", "zsh", "dash", "bats"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            interpreters: ["sh", "bash", "dash", "ksh", "zsh", "ash", "busybox", "mksh"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ClassifyConfig {
    /// Lowercases entries and strips a leading `.` from extensions.
    pub fn normalize(&mut self) {
        for ext in &mut self.extensions {
            *ext = ext.trim().trim_start_matches('.').to_lowercase();
        }
        self.extensions.retain(|e| !e.is_empty());
        for interp in &mut self.interpreters {
            *interp = interp.trim().to_string();
        }
        self.interpreters.retain(|i| !i.is_empty());
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// Resolution order:
    /// 1. If `path` is `Some`, load from that file (error if missing).
    /// 2. If `path` is `None`, try [`DEFAULT_CONFIG_FILE`] in the current directory.
    /// 3. If that file does not exist either, return [`Config::default()`].
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when the explicit path does not exist, the file
    /// cannot be read, the TOML fails to parse, or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let config_path = match path {
            Some(p) if p.exists() => Some(p.to_path_buf()),
            Some(p) => return Err(GateError::ConfigNotFound(p.to_path_buf())),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        let mut config = match config_path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|source| GateError::ConfigRead {
                        path: path.clone(),
                        source,
                    })?;
                tracing::debug!(path = %path.display(), "loaded config file");
                toml::from_str(&content).map_err(|source| GateError::ConfigParse { path, source })?
            }
            None => Config::default(),
        };

        config.finalize()?;
        Ok(config)
    }

    /// Normalizes and validates values. Call again after applying overrides.
    pub fn finalize(&mut self) -> Result<()> {
        self.classify.normalize();

        if self.lint.timeout_secs == 0 {
            return Err(GateError::InvalidValue {
                field: "lint.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.lint.tool.trim().is_empty() {
            return Err(GateError::InvalidValue {
                field: "lint.tool",
                reason: "must not be empty".to_string(),
            });
        }
        if self.classify.extensions.is_empty() && self.classify.interpreters.is_empty() {
            return Err(GateError::InvalidValue {
                field: "classify",
                reason: "at least one extension or interpreter is required".to_string(),
            });
        }
        Ok(())
    }
}
