//! Modified-line filtering.
//!
//! [`filter`] keeps a finding only when its line is in the modified-line set
//! of its file. Files absent from the map contribute nothing.

use crate::diff::ModifiedLines;
use crate::finding::{FilterResult, Finding, Severity};
use std::collections::BTreeMap;

/// Intersects findings with the modified-line map.
///
/// Retained findings are ordered by the file's position in the diff, then
/// by line, then by column; files the diff does not know are dropped, so the
/// order never depends on how findings arrived.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use shell_diff_gate::diff::{ModifiedLineSet, ModifiedLines};
/// use shell_diff_gate::filter::filter;
/// use shell_diff_gate::finding::Severity;
///
/// let modified = ModifiedLines::from_entries([("a.sh", ModifiedLineSet::from_iter([3]))]);
/// let result = filter(&BTreeMap::new(), &modified, Severity::Warning);
/// assert_eq!(result.total_after, 0);
/// assert!(result.passed);
/// ```
pub fn filter(
    findings_by_file: &BTreeMap<String, Vec<Finding>>,
    modified: &ModifiedLines,
    threshold: Severity,
) -> FilterResult {
    let total_before = findings_by_file.values().map(Vec::len).sum();

    let mut keyed: Vec<(usize, &Finding)> = Vec::new();
    for (path, findings) in findings_by_file {
        let (Some(position), Some(lines)) = (modified.position(path), modified.get(path)) else {
            if !findings.is_empty() {
                tracing::debug!(file = %path, count = findings.len(), "file not in diff; findings suppressed");
            }
            continue;
        };
        keyed.extend(
            findings
                .iter()
                .filter(|f| lines.contains(f.line))
                .map(|f| (position, f)),
        );
    }

    keyed.sort_by(|(pa, a), (pb, b)| {
        pa.cmp(pb)
            .then(a.line.cmp(&b.line))
            .then(a.column.cmp(&b.column))
    });

    let retained: Vec<Finding> = keyed.into_iter().map(|(_, f)| f.clone()).collect();
    let passed = !retained.iter().any(|f| f.severity.is_blocking(threshold));

    tracing::debug!(
        before = total_before,
        after = retained.len(),
        passed,
        "line filter applied"
    );

    FilterResult {
        total_before,
        total_after: retained.len(),
        retained,
        threshold,
        passed,
    }
}
