//! Line-oriented diagnostics for inline annotation tooling.
//!
//! Each retained finding becomes one line:
//!
//! ```text
//! deploy.sh:11:6: info SC2086: Double quote to prevent globbing and word splitting. [shellcheck/SC2086]
//! ```
//!
//! which matches the errorformat `%f:%l:%c: %t%*[^ ] %*[^:]: %m [%*[^]]]`.

use crate::finding::Finding;

/// Formats a single finding.
pub fn format_finding(f: &Finding) -> String {
    format!(
        "{}:{}:{}: {} {}: {} [{}]",
        f.file,
        f.line,
        f.column,
        f.severity,
        f.code,
        single_line(&f.message),
        f.rule_id,
    )
}

/// Formats findings in the order given, one per line, newline-terminated.
pub fn format(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format_finding(f) + "\n")
        .collect()
}

fn single_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}
