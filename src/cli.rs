use clap::{Parser, Subcommand};
use shell_diff_gate::finding::Severity;
use shell_diff_gate::output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "shell-diff-gate",
    version,
    about = "Lint the shell scripts a diff touches and report only issues on modified lines"
)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint changed shell scripts and report findings on modified lines
    Check {
        /// Unified diff file, or "-" for stdin
        #[arg(long)]
        diff: PathBuf,

        /// Newline-separated list of changed files (defaults to the files in the diff)
        #[arg(long)]
        files: Option<PathBuf>,

        /// Repository root the diff paths are relative to
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Machine report format
        #[arg(long, short, value_enum, env = "SHELL_DIFF_GATE_FORMAT")]
        format: Option<OutputFormat>,

        /// Write the machine report to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Write the plain-text summary to a file instead of printing it to stderr
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Lint tool binary or path
        #[arg(long, env = "SHELL_DIFF_GATE_LINT_TOOL")]
        lint_tool: Option<String>,

        /// Lowest severity that fails the gate
        #[arg(long, value_enum, env = "SHELL_DIFF_GATE_THRESHOLD")]
        threshold: Option<Severity>,

        /// Per-file lint timeout in seconds
        #[arg(long, env = "SHELL_DIFF_GATE_TIMEOUT")]
        timeout: Option<u64>,

        /// Comma-separated shell script extensions
        #[arg(long, value_delimiter = ',', env = "SHELL_DIFF_GATE_EXTENSIONS")]
        extensions: Option<Vec<String>>,

        /// Fail when the lint tool could not check some of the files
        #[arg(long)]
        fail_on_tool_error: bool,
    },

    /// Print the modified-line map of a diff as JSON
    #[command(name = "parse-diff")]
    ParseDiff {
        /// Unified diff file, or "-" for stdin
        #[arg(long, default_value = "-")]
        diff: PathBuf,
    },

    /// Check whether the lint tool is available
    CheckTools {
        /// Lint tool binary or path
        #[arg(long, env = "SHELL_DIFF_GATE_LINT_TOOL")]
        lint_tool: Option<String>,

        /// Custom config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
