#![allow(dead_code)]

use shell_diff_gate::classify::ShellScript;
use shell_diff_gate::error::ToolFailure;
use shell_diff_gate::finding::{Finding, Severity};
use shell_diff_gate::lint::{Linter, ToolReport};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// In-memory linter returning canned results per path.
///
/// Paths without an entry lint clean. Every call is recorded so tests can
/// assert which files were handed to the tool.
#[derive(Default)]
pub struct FakeLinter {
    results: HashMap<String, Result<Vec<Finding>, ToolFailure>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeLinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_findings(mut self, path: &str, findings: Vec<Finding>) -> Self {
        self.results.insert(path.to_string(), Ok(findings));
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.results.insert(
            path.to_string(),
            Err(ToolFailure::Spawn {
                tool: "fake".to_string(),
                message: "No such file or directory (os error 2)".to_string(),
            }),
        );
        self
    }

    pub fn called(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl Linter for FakeLinter {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn lint(&self, script: &ShellScript, _root: &Path) -> Result<ToolReport, ToolFailure> {
        self.calls.lock().unwrap().push(script.path.clone());
        match self.results.get(&script.path) {
            Some(Ok(findings)) => Ok(ToolReport {
                findings: findings.clone(),
                dropped: vec![],
            }),
            Some(Err(failure)) => Err(failure.clone()),
            None => Ok(ToolReport::default()),
        }
    }
}

pub fn finding(file: &str, line: usize, column: usize, severity: Severity) -> Finding {
    Finding {
        file: file.to_string(),
        line,
        column,
        severity,
        code: "SC2086".to_string(),
        rule_id: "shellcheck/SC2086".to_string(),
        message: "Double quote to prevent globbing and word splitting.".to_string(),
        source_line: None,
    }
}

/// Writes `files` (relative path, content) under a fresh temp directory.
pub fn repo(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }
    dir
}

/// A script of `n` numbered echo lines.
pub fn numbered_script(n: usize) -> String {
    let mut s = String::from("#!/bin/bash\n");
    for i in 2..=n {
        s.push_str(&format!("echo line{i}\n"));
    }
    s
}

/// Diff adding three lines (10-12) to `deploy.sh` between lines 9 and 10.
pub const DEPLOY_DIFF: &str = "\
diff --git a/deploy.sh b/deploy.sh
index 1111111..2222222 100755
--- a/deploy.sh
+++ b/deploy.sh
@@ -9,2 +9,5 @@ main() {
 echo line9
+echo added10
+echo added11
+echo added12
 echo line10
";
