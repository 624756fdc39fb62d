//! Shell script detection.
//!
//! A candidate is a shell script when its extension is in the configured
//! allowlist, or, for extensionless files, when its first line is a shebang
//! naming a shell interpreter. Candidates missing from disk are dropped, and
//! directories are expanded recursively.
//!
//! Anything that cannot be read or classified is excluded: the gate prefers
//! missing a script over linting something that is not one.

use crate::config::ClassifyConfig;
use crate::finding::{Stage, Warning};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

static RE_SHEBANG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z0-9_.+-]+)")
        .expect("valid shebang regex")
});

/// Bytes read from a file when looking for a shebang.
const SHEBANG_PROBE_LEN: usize = 256;

/// Why a file was classified as a shell script.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum DetectionReason {
    /// Matched extension, without the leading dot.
    Extension(String),
    /// Interpreter named in the shebang.
    Shebang(String),
}

impl fmt::Display for DetectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionReason::Extension(ext) => write!(f, "extension .{ext}"),
            DetectionReason::Shebang(interp) => write!(f, "shebang {interp}"),
        }
    }
}

/// A file confirmed to be a shell script.
///
/// Ordered by path so a set of scripts iterates deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct ShellScript {
    /// Repository-relative path with forward slashes.
    pub path: String,
    pub reason: DetectionReason,
}

/// Outcome of classifying a candidate list.
#[derive(Debug, Default)]
pub struct Classification {
    pub scripts: BTreeSet<ShellScript>,
    pub warnings: Vec<Warning>,
}

/// Classifies `candidates` (paths relative to `root`).
///
/// # Examples
///
/// ```rust,no_run
/// use std::path::Path;
/// use shell_diff_gate::classify::classify;
/// use shell_diff_gate::config::ClassifyConfig;
///
/// let result = classify(
///     &["deploy.sh".to_string(), "README.md".to_string()],
///     Path::new("."),
///     &ClassifyConfig::default(),
/// );
/// for script in &result.scripts {
///     println!("{} ({})", script.path, script.reason);
/// }
/// ```
pub fn classify(candidates: &[String], root: &Path, config: &ClassifyConfig) -> Classification {
    let mut result = Classification::default();

    for candidate in candidates {
        let candidate = normalize_path(candidate.trim());
        if candidate.is_empty() {
            continue;
        }

        let full = root.join(&candidate);
        if full.is_dir() {
            for entry in WalkDir::new(&full)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let Ok(rel) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let rel = normalize_path(&rel.to_string_lossy());
                classify_file(&rel, entry.path(), config, &mut result);
            }
        } else if full.is_file() {
            classify_file(&candidate, &full, config, &mut result);
        } else {
            tracing::debug!(path = %candidate, "candidate not on disk; skipped");
        }
    }

    tracing::debug!(
        candidates = candidates.len(),
        scripts = result.scripts.len(),
        "classification complete"
    );
    result
}

fn classify_file(rel: &str, full: &Path, config: &ClassifyConfig, result: &mut Classification) {
    match detect(full, config) {
        Ok(Some(reason)) => {
            result.scripts.insert(ShellScript {
                path: rel.to_string(),
                reason,
            });
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(path = rel, error = %e, "could not inspect file; excluded");
            result.warnings.push(Warning::new(
                Stage::Classify,
                Some(rel),
                format!("could not read file for shebang detection: {e}"),
            ));
        }
    }
}

/// Decides whether a single file on disk is a shell script.
///
/// Returns `Ok(None)` for non-shell files; only extensionless files are
/// opened to look for a shebang.
pub fn detect(path: &Path, config: &ClassifyConfig) -> std::io::Result<Option<DetectionReason>> {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            Ok(config
                .extensions
                .iter()
                .any(|e| *e == ext)
                .then_some(DetectionReason::Extension(ext)))
        }
        None => {
            let first_line = read_first_line(path)?;
            Ok(shebang_interpreter(&first_line)
                .filter(|interp| config.interpreters.iter().any(|i| i == interp))
                .map(DetectionReason::Shebang))
        }
    }
}

/// Extracts the interpreter name from a shebang line.
///
/// Handles absolute paths (`#!/bin/bash`), `env` indirection
/// (`#!/usr/bin/env -S bash -e`) and trailing arguments.
///
/// ```
/// use shell_diff_gate::classify::shebang_interpreter;
///
/// assert_eq!(shebang_interpreter("#!/usr/bin/env bash"), Some("bash".to_string()));
/// assert_eq!(shebang_interpreter("#!/bin/sh -eu"), Some("sh".to_string()));
/// assert_eq!(shebang_interpreter("echo hi"), None);
/// ```
pub fn shebang_interpreter(line: &str) -> Option<String> {
    RE_SHEBANG
        .captures(line.trim_end())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn read_first_line(path: &Path) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(SHEBANG_PROBE_LEN);
    std::fs::File::open(path)?
        .take(SHEBANG_PROBE_LEN as u64)
        .read_to_end(&mut buf)?;
    let end = buf.iter().position(|&b| b == b'\n').unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").map(str::to_string).unwrap_or(path)
}
