//! # shell-diff-gate
//!
//! Diff-aware shell linting for code review.
//!
//! Given a pull request's unified diff, `shell-diff-gate` finds the shell
//! scripts it touches, runs [ShellCheck] on them, and reports only the
//! findings that land on added lines. Pre-existing issues elsewhere in the
//! file are suppressed, so reviewers see what the change introduced.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use shell_diff_gate::{config::Config, gate, lint::shellcheck::ShellCheck, report};
//!
//! let config = Config::load(None).expect("failed to load config");
//! let diff_text = std::fs::read_to_string("pr.diff").expect("diff");
//! let input = gate::GateInput { diff_text: &diff_text, files: None, root: Path::new(".") };
//!
//! let run = gate::run_gate(&input, &config, &ShellCheck::from_config(&config.lint));
//! let report = report::build(&run, config.output.format);
//! print!("{}", report.machine);
//! std::process::exit(report.exit_code);
//! ```
//!
//! ## Architecture
//!
//! Data flows strictly forward through the pipeline:
//!
//! 1. **[`diff`]**: parse the unified diff into per-file modified-line sets.
//! 2. **[`classify`]**: decide which changed files are shell scripts.
//! 3. **[`lint`]**: run the lint tool per script (in parallel via [rayon])
//!    and map its output to [`finding::Finding`]s.
//! 4. **[`filter`]**: keep findings on modified lines only.
//! 5. **[`report`]** / **[`output`]**: render the machine report and the
//!    human summary, and derive the exit code.
//!
//! [`gate`] wires the stages together; [`config`] and [`error`] carry the
//! ambient configuration and error types.
//!
//! [ShellCheck]: https://www.shellcheck.net/

pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod finding;
pub mod gate;
pub mod lint;
pub mod output;
pub mod report;
