//! Unified diff parsing.
//!
//! [`parse`] turns a unified diff (as produced by `git diff` or `diff -u`)
//! into a [`ParsedDiff`]: one [`DiffFile`] per file block, each carrying its
//! hunks and, within every hunk, the new-file line number of each added or
//! context line.
//!
//! The parser supports:
//! - `diff --git` headers, including quoted paths containing spaces
//! - plain `--- a` / `+++ b` header pairs without a `diff --git` line
//! - new files (`/dev/null` source), deleted files (`/dev/null` target)
//! - renames and copies, with or without content changes
//! - binary files (`Binary files ... differ`, `GIT binary patch`)
//! - multiple hunks per file and omitted hunk counts (`@@ -3 +3 @@`)
//! - `\ No newline at end of file` markers
//!
//! Hunk bodies are consumed by count, so a removed line whose content starts
//! with `-- ` is never mistaken for a file header.
//!
//! A hunk header that cannot be parsed drops that file's contribution and
//! records a [`Warning`]; the remaining files still parse.

use crate::finding::{Stage, Warning};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

static RE_HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@+ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@+").expect("valid hunk header regex")
});

/// How a file changed between the two versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Binary,
}

/// Classification of one physical line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HunkLine {
    pub kind: LineKind,
    /// Line number in the new file; `None` for removed lines.
    pub new_line: Option<usize>,
}

/// A contiguous change region.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// New-file line numbers of the added lines in this hunk.
    pub fn added_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Added)
            .filter_map(|l| l.new_line)
    }
}

/// One file block of the diff.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiffFile {
    /// Path in the old version; `None` for added files.
    pub old_path: Option<String>,
    /// Path in the new version; `None` for deleted files.
    pub new_path: Option<String>,
    pub status: FileStatus,
    pub hunks: Vec<Hunk>,
}

impl DiffFile {
    /// The key this file is known by: the new path, or the old path when
    /// the file was deleted.
    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or_default()
    }

    /// Returns `true` when the file exists in the new version and has
    /// textual content that can be linted.
    pub fn is_lintable(&self) -> bool {
        !matches!(self.status, FileStatus::Deleted | FileStatus::Binary)
    }

    /// New-file line numbers of every added line across all hunks.
    ///
    /// Deleted and binary files always yield an empty set.
    pub fn modified_lines(&self) -> ModifiedLineSet {
        self.modified_lines_with_context(0)
    }

    /// Like [`modified_lines`](Self::modified_lines), but also counts context
    /// lines within `radius` lines of an addition in the same hunk.
    pub fn modified_lines_with_context(&self, radius: usize) -> ModifiedLineSet {
        let mut lines = BTreeSet::new();
        if !self.is_lintable() {
            return ModifiedLineSet(lines);
        }

        for hunk in &self.hunks {
            let added: Vec<usize> = hunk.added_lines().collect();
            lines.extend(added.iter().copied());

            if radius == 0 || added.is_empty() {
                continue;
            }
            for line in &hunk.lines {
                if line.kind != LineKind::Context {
                    continue;
                }
                let Some(n) = line.new_line else { continue };
                if added.iter().any(|&a| a.abs_diff(n) <= radius) {
                    lines.insert(n);
                }
            }
        }

        ModifiedLineSet(lines)
    }
}

/// The set of new-file line numbers considered modified in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ModifiedLineSet(BTreeSet<usize>);

impl ModifiedLineSet {
    pub fn contains(&self, line: usize) -> bool {
        self.0.contains(&line)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Line numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for ModifiedLineSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        ModifiedLineSet(iter.into_iter().collect())
    }
}

/// Modified-line sets for every file of a diff, in diff order.
///
/// This is the only diff-derived structure the line filter consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifiedLines {
    order: Vec<String>,
    sets: HashMap<String, ModifiedLineSet>,
}

impl ModifiedLines {
    /// Builds a map from `(path, set)` pairs. The first occurrence of a
    /// path fixes its position; later occurrences are merged into it.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ModifiedLineSet)>,
        S: Into<String>,
    {
        let mut map = ModifiedLines::default();
        for (path, set) in entries {
            map.insert(path.into(), set);
        }
        map
    }

    fn insert(&mut self, path: String, set: ModifiedLineSet) {
        match self.sets.get_mut(&path) {
            Some(existing) => existing.0.extend(set.0),
            None => {
                self.order.push(path.clone());
                self.sets.insert(path, set);
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&ModifiedLineSet> {
        self.sets.get(path)
    }

    /// Position of `path` in diff order.
    pub fn position(&self, path: &str) -> Option<usize> {
        self.order.iter().position(|p| p == path)
    }

    /// Paths in the order they first appeared in the diff.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Result of parsing a whole diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    files: Vec<DiffFile>,
    index: HashMap<String, usize>,
    /// Non-fatal problems met while parsing (malformed hunks, count mismatches).
    pub warnings: Vec<Warning>,
}

impl ParsedDiff {
    /// Looks up a file by its [`DiffFile::path`].
    pub fn get(&self, path: &str) -> Option<&DiffFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    /// Files in diff order.
    pub fn files(&self) -> &[DiffFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Strict added-line map for every file.
    pub fn modified_lines(&self) -> ModifiedLines {
        self.modified_lines_with_context(0)
    }

    /// Added-line map widened by `radius` context lines around each addition.
    pub fn modified_lines_with_context(&self, radius: usize) -> ModifiedLines {
        ModifiedLines::from_entries(
            self.files
                .iter()
                .map(|f| (f.path(), f.modified_lines_with_context(radius))),
        )
    }

    fn push(&mut self, file: DiffFile) {
        let key = file.path().to_string();
        if key.is_empty() {
            return;
        }
        match self.index.get(&key) {
            // The same path twice (e.g. concatenated diffs): merge hunks.
            Some(&i) => self.files[i].hunks.extend(file.hunks),
            None => {
                self.index.insert(key, self.files.len());
                self.files.push(file);
            }
        }
    }
}

/// Parses unified diff text into per-file change records.
///
/// Never fails: malformed fragments are skipped and reported through
/// [`ParsedDiff::warnings`]. An empty input yields an empty result.
///
/// # Examples
///
/// ```
/// use shell_diff_gate::diff;
///
/// let text = "\
/// diff --git a/deploy.sh b/deploy.sh
/// --- a/deploy.sh
/// +++ b/deploy.sh
/// @@ -9,2 +9,3 @@
///  echo start
/// +echo new
///  echo end
/// ";
/// let parsed = diff::parse(text);
/// let lines = parsed.get("deploy.sh").unwrap().modified_lines();
/// assert_eq!(lines.iter().collect::<Vec<_>>(), vec![10]);
/// ```
pub fn parse(diff_text: &str) -> ParsedDiff {
    let mut parser = Parser::default();
    let mut lines = diff_text.lines().peekable();

    while let Some(line) = lines.next() {
        let next_is_new_header = lines.peek().is_some_and(|l| l.starts_with("+++ "));
        parser.feed(line, next_is_new_header);
    }

    parser.finish()
}

#[derive(Default)]
struct FileBuilder {
    old_path: Option<String>,
    new_path: Option<String>,
    added: bool,
    deleted: bool,
    renamed: bool,
    binary: bool,
    saw_old_header: bool,
    hunks: Vec<Hunk>,
    /// Set once a malformed hunk header is seen; the file is then dropped.
    malformed: bool,
}

impl FileBuilder {
    fn display_path(&self) -> String {
        self.new_path
            .clone()
            .or_else(|| self.old_path.clone())
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    fn build(self) -> Option<DiffFile> {
        if self.malformed {
            return None;
        }

        let new_path = if self.deleted { None } else { self.new_path };
        let old_path = if self.added { None } else { self.old_path };

        let status = if self.binary {
            FileStatus::Binary
        } else if new_path.is_none() {
            FileStatus::Deleted
        } else if old_path.is_none() {
            FileStatus::Added
        } else if self.renamed || old_path != new_path {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        };

        let hunks = if status == FileStatus::Binary {
            Vec::new()
        } else {
            self.hunks
        };

        Some(DiffFile {
            old_path,
            new_path,
            status,
            hunks,
        })
    }
}

struct OpenHunk {
    hunk: Hunk,
    old_remaining: usize,
    new_remaining: usize,
    next_new_line: usize,
}

/// A hunk whose counts were met, plus body-like lines seen after it.
struct ExhaustedHunk {
    path: String,
    header: (usize, usize, usize, usize),
    extra: usize,
}

#[derive(Default)]
struct Parser {
    result: ParsedDiff,
    current: Option<FileBuilder>,
    hunk: Option<OpenHunk>,
    exhausted: Option<ExhaustedHunk>,
}

impl Parser {
    fn feed(&mut self, line: &str, next_is_new_header: bool) {
        if self.exhausted.is_some() {
            if line.starts_with('\\') {
                return;
            }
            if is_excess_body_line(line, next_is_new_header) {
                if let Some(exhausted) = self.exhausted.as_mut() {
                    exhausted.extra += 1;
                }
                return;
            }
            self.flush_excess();
        }

        if self.hunk.is_some() && self.feed_hunk_body(line) {
            return;
        }

        // Marker trailing the last body line of a hunk.
        if line.starts_with('\\') {
            return;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            self.finish_file();
            let (old_path, new_path) = parse_git_header_paths(rest);
            self.current = Some(FileBuilder {
                old_path,
                new_path,
                ..FileBuilder::default()
            });
            return;
        }

        if let Some(rest) = line.strip_prefix("--- ") {
            if !next_is_new_header {
                return;
            }
            let starts_new_block = match &self.current {
                Some(file) => file.saw_old_header || !file.hunks.is_empty() || file.malformed,
                None => true,
            };
            if starts_new_block {
                self.finish_file();
                self.current = Some(FileBuilder::default());
            }
            if let Some(file) = self.current.as_mut() {
                file.saw_old_header = true;
                match parse_header_path(rest, "a/") {
                    Some(path) => file.old_path = Some(path),
                    None => file.added = true,
                }
            }
            return;
        }

        let Some(file) = self.current.as_mut() else {
            if line.starts_with("@@") {
                self.result.warnings.push(Warning::new(
                    Stage::Diff,
                    None,
                    "hunk header outside of any file block ignored",
                ));
            }
            return;
        };

        if let Some(rest) = line.strip_prefix("+++ ") {
            match parse_header_path(rest, "b/") {
                Some(path) => file.new_path = Some(path),
                None => file.deleted = true,
            }
        } else if line.starts_with("new file mode") {
            file.added = true;
        } else if line.starts_with("deleted file mode") {
            file.deleted = true;
        } else if let Some(rest) = line
            .strip_prefix("rename from ")
            .or_else(|| line.strip_prefix("copy from "))
        {
            file.old_path = Some(unquote(rest));
            file.renamed = line.starts_with("rename");
            if line.starts_with("copy") {
                file.added = true;
            }
        } else if let Some(rest) = line
            .strip_prefix("rename to ")
            .or_else(|| line.strip_prefix("copy to "))
        {
            file.new_path = Some(unquote(rest));
        } else if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            file.binary = true;
        } else if line.starts_with("@@") {
            if file.malformed {
                return;
            }
            match parse_hunk_header(line) {
                Some(h) => {
                    self.hunk = Some(OpenHunk {
                        old_remaining: h.old_count,
                        new_remaining: h.new_count,
                        next_new_line: h.new_start,
                        hunk: h,
                    });
                    // Zero-length hunks close immediately.
                    self.close_hunk_if_done();
                }
                None => {
                    file.malformed = true;
                    let path = file.display_path();
                    tracing::warn!(file = %path, header = line, "malformed hunk header; skipping file");
                    self.result.warnings.push(Warning::new(
                        Stage::Diff,
                        Some(path.as_str()),
                        format!("malformed hunk header '{line}'; file skipped"),
                    ));
                }
            }
        }
    }

    /// Consumes `line` as part of the open hunk. Returns `false` when the
    /// line does not belong to the hunk (the hunk is closed in that case).
    fn feed_hunk_body(&mut self, line: &str) -> bool {
        let Some(open) = self.hunk.as_mut() else {
            return false;
        };

        let kind = match line.as_bytes().first() {
            Some(b'+') if open.new_remaining > 0 => LineKind::Added,
            Some(b'-') if open.old_remaining > 0 => LineKind::Removed,
            // Some tools strip the single space from empty context lines.
            Some(b' ') | None if open.old_remaining > 0 && open.new_remaining > 0 => {
                LineKind::Context
            }
            Some(b'\\') => return true,
            _ => {
                self.close_hunk();
                return false;
            }
        };

        let new_line = match kind {
            LineKind::Removed => {
                open.old_remaining -= 1;
                None
            }
            LineKind::Added => {
                open.new_remaining -= 1;
                let n = open.next_new_line;
                open.next_new_line += 1;
                Some(n)
            }
            LineKind::Context => {
                open.old_remaining -= 1;
                open.new_remaining -= 1;
                let n = open.next_new_line;
                open.next_new_line += 1;
                Some(n)
            }
        };
        open.hunk.lines.push(HunkLine { kind, new_line });

        self.close_hunk_if_done();
        true
    }

    fn close_hunk_if_done(&mut self) {
        let Some(open) = self.hunk.as_ref() else { return };
        if open.old_remaining > 0 || open.new_remaining > 0 {
            return;
        }

        let h = &open.hunk;
        let header = (h.old_start, h.old_count, h.new_start, h.new_count);
        let path = self.current.as_ref().map(FileBuilder::display_path);
        self.close_hunk();
        if let Some(path) = path {
            self.exhausted = Some(ExhaustedHunk {
                path,
                header,
                extra: 0,
            });
        }
    }

    /// Reports body lines that trailed a hunk whose counts were already met.
    fn flush_excess(&mut self) {
        let Some(exhausted) = self.exhausted.take() else { return };
        if exhausted.extra == 0 {
            return;
        }

        let (old_start, old_count, new_start, new_count) = exhausted.header;
        let message = format!(
            "hunk @@ -{old_start},{old_count} +{new_start},{new_count} @@ has {} more line(s) than its header declares; extra lines ignored",
            exhausted.extra,
        );
        tracing::warn!(file = %exhausted.path, "{message}");
        self.result.warnings.push(Warning::new(
            Stage::Diff,
            Some(exhausted.path.as_str()),
            message,
        ));
    }

    fn close_hunk(&mut self) {
        let Some(open) = self.hunk.take() else { return };
        let Some(file) = self.current.as_mut() else { return };

        if open.old_remaining > 0 || open.new_remaining > 0 {
            let path = file.display_path();
            let message = format!(
                "hunk @@ -{},{} +{},{} @@ ended early ({} old / {} new lines missing)",
                open.hunk.old_start,
                open.hunk.old_count,
                open.hunk.new_start,
                open.hunk.new_count,
                open.old_remaining,
                open.new_remaining,
            );
            tracing::warn!(file = %path, "{message}");
            self.result
                .warnings
                .push(Warning::new(Stage::Diff, Some(path.as_str()), message));
        }

        file.hunks.push(open.hunk);
    }

    fn finish_file(&mut self) {
        self.flush_excess();
        self.close_hunk();
        if let Some(file) = self.current.take() {
            if let Some(diff_file) = file.build() {
                tracing::debug!(
                    file = diff_file.path(),
                    status = ?diff_file.status,
                    hunks = diff_file.hunks.len(),
                    "parsed diff file"
                );
                self.result.push(diff_file);
            }
        }
    }

    fn finish(mut self) -> ParsedDiff {
        self.finish_file();
        self.result
    }
}

fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let caps = RE_HUNK_HEADER.captures(line)?;
    let number = |i: usize, default: usize| -> Option<usize> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(default),
        }
    };

    let hunk = Hunk {
        old_start: number(1, 0)?,
        old_count: number(2, 1)?,
        new_start: number(3, 0)?,
        new_count: number(4, 1)?,
        lines: Vec::new(),
    };
    // Ranges that run past usize cannot be numbered.
    hunk.old_start.checked_add(hunk.old_count)?;
    hunk.new_start.checked_add(hunk.new_count)?;
    Some(hunk)
}

/// Whether `line` looks like hunk body rather than a header or trailer.
///
/// `--- ` before a `+++ ` line opens the next file, and `-- ` is the
/// format-patch signature separator.
fn is_excess_body_line(line: &str, next_is_new_header: bool) -> bool {
    match line.as_bytes().first() {
        Some(b'+') | Some(b' ') => true,
        Some(b'-') => !(line.trim_end() == "--" || (line.starts_with("--- ") && next_is_new_header)),
        _ => false,
    }
}

/// Parses the path portion of a `---`/`+++` line.
///
/// Returns `None` for `/dev/null`. Strips a trailing tab-separated timestamp
/// and the `a/`/`b/` prefix.
fn parse_header_path(rest: &str, prefix: &str) -> Option<String> {
    let raw = rest.split('\t').next().unwrap_or(rest).trim_end();
    if raw == "/dev/null" {
        return None;
    }
    let path = unquote(raw);
    Some(
        path.strip_prefix(prefix)
            .map(str::to_string)
            .unwrap_or(path),
    )
}

/// Splits the `a/<old> b/<new>` tail of a `diff --git` line.
///
/// Paths may contain spaces, so the unquoted form is split on the last
/// ` b/`. Quoted paths are decoded first.
fn parse_git_header_paths(rest: &str) -> (Option<String>, Option<String>) {
    if rest.starts_with('"') {
        let (old, tail) = split_quoted(rest);
        let tail = tail.trim_start();
        let new = if tail.starts_with('"') {
            split_quoted(tail).0
        } else {
            tail.to_string()
        };
        return (
            Some(strip_path_prefix(&old, "a/")),
            Some(strip_path_prefix(&new, "b/")),
        );
    }

    match rest.rfind(" b/") {
        Some(pos) => {
            let old = &rest[..pos];
            let new = &rest[pos + 1..];
            let new = if new.ends_with('"') { unquote(new) } else { new.to_string() };
            (
                Some(strip_path_prefix(old, "a/")),
                Some(strip_path_prefix(&new, "b/")),
            )
        }
        None => (None, None),
    }
}

fn strip_path_prefix(path: &str, prefix: &str) -> String {
    path.strip_prefix(prefix).unwrap_or(path).to_string()
}

/// Reads one C-style quoted string from the start of `s`, returning the
/// decoded value and the remainder after the closing quote.
fn split_quoted(s: &str) -> (String, &str) {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::new();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return (String::from_utf8_lossy(&out).into_owned(), &s[i + 1..]),
            b'\\' if i + 1 < bytes.len() => {
                let esc = bytes[i + 1];
                match esc {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'"' => out.push(b'"'),
                    b'\\' => out.push(b'\\'),
                    b'0'..=b'7' => {
                        let digits: Vec<u8> = bytes[i + 1..]
                            .iter()
                            .take(3)
                            .take_while(|b| (b'0'..=b'7').contains(b))
                            .copied()
                            .collect();
                        let value = digits
                            .iter()
                            .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                        out.push(value as u8);
                        i += 1 + digits.len();
                        continue;
                    }
                    other => out.push(other),
                }
                i += 2;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    (String::from_utf8_lossy(&out).into_owned(), "")
}

fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        split_quoted(s).0
    } else {
        s.to_string()
    }
}
