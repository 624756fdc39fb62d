use shell_diff_gate::diff::{self, FileStatus, LineKind};
use shell_diff_gate::finding::Stage;

fn lines_of(parsed: &diff::ParsedDiff, path: &str) -> Vec<usize> {
    parsed
        .get(path)
        .unwrap_or_else(|| panic!("{path} missing from parsed diff"))
        .modified_lines()
        .iter()
        .collect()
}

// ── basic hunks ───────────────────────────────────────────────────────────────

#[test]
fn added_lines_get_new_file_numbers() {
    let text = "\
diff --git a/deploy.sh b/deploy.sh
index abc1234..def5678 100644
--- a/deploy.sh
+++ b/deploy.sh
@@ -10,0 +11,2 @@ deploy() {
+    rsync -a build/ \"$TARGET\"
+    echo done
";
    let parsed = diff::parse(text);
    assert_eq!(parsed.len(), 1);
    assert_eq!(lines_of(&parsed, "deploy.sh"), vec![11, 12]);
    assert!(parsed.warnings.is_empty());
}

#[test]
fn context_and_removed_lines_are_not_modified() {
    let text = "\
diff --git a/run.sh b/run.sh
--- a/run.sh
+++ b/run.sh
@@ -4,4 +4,4 @@
 set -e
-echo old
+echo new
 cd /tmp
 ls
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "run.sh"), vec![5]);

    let hunk = &parsed.get("run.sh").unwrap().hunks[0];
    let kinds: Vec<(LineKind, Option<usize>)> =
        hunk.lines.iter().map(|l| (l.kind, l.new_line)).collect();
    assert_eq!(
        kinds,
        vec![
            (LineKind::Context, Some(4)),
            (LineKind::Removed, None),
            (LineKind::Added, Some(5)),
            (LineKind::Context, Some(6)),
            (LineKind::Context, Some(7)),
        ]
    );
}

#[test]
fn multiple_hunks_accumulate_across_the_file() {
    let text = "\
diff --git a/build.sh b/build.sh
--- a/build.sh
+++ b/build.sh
@@ -2,2 +2,3 @@
 a
+b
 c
@@ -40,3 +41,2 @@
 x
-y
-z
+w
";
    let parsed = diff::parse(text);
    let file = parsed.get("build.sh").unwrap();
    assert_eq!(file.hunks.len(), 2);
    assert_eq!(lines_of(&parsed, "build.sh"), vec![3, 42]);
}

#[test]
fn omitted_hunk_counts_default_to_one() {
    let text = "\
diff --git a/a.sh b/a.sh
--- a/a.sh
+++ b/a.sh
@@ -3 +3 @@
-echo $x
+echo \"$x\"
";
    let parsed = diff::parse(text);
    let hunk = &parsed.get("a.sh").unwrap().hunks[0];
    assert_eq!((hunk.old_count, hunk.new_count), (1, 1));
    assert_eq!(lines_of(&parsed, "a.sh"), vec![3]);
}

#[test]
fn removed_line_looking_like_a_header_stays_in_the_hunk() {
    let text = "\
diff --git a/x.sh b/x.sh
--- a/x.sh
+++ b/x.sh
@@ -1,3 +1,3 @@
 echo a
--- old comment
+++ new comment
 echo c
";
    let parsed = diff::parse(text);
    assert_eq!(parsed.len(), 1);
    assert_eq!(lines_of(&parsed, "x.sh"), vec![2]);
    assert!(parsed.warnings.is_empty());
}

#[test]
fn no_newline_marker_is_ignored() {
    let text = "\
diff --git a/a.sh b/a.sh
--- a/a.sh
+++ b/a.sh
@@ -1,1 +1,2 @@
 echo a
+echo b
\\ No newline at end of file
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "a.sh"), vec![2]);
    assert!(parsed.warnings.is_empty());
}

// ── file statuses ─────────────────────────────────────────────────────────────

#[test]
fn new_file_marks_every_line_added() {
    let text = "\
diff --git a/new.sh b/new.sh
new file mode 100755
index 0000000..e69de29
--- /dev/null
+++ b/new.sh
@@ -0,0 +1,3 @@
+#!/bin/sh
+echo a
+echo b
";
    let parsed = diff::parse(text);
    let file = parsed.get("new.sh").unwrap();
    assert_eq!(file.status, FileStatus::Added);
    assert_eq!(file.old_path, None);
    assert_eq!(lines_of(&parsed, "new.sh"), vec![1, 2, 3]);
}

#[test]
fn deleted_file_has_no_modified_lines() {
    let text = "\
diff --git a/gone.sh b/gone.sh
deleted file mode 100644
index abc1234..0000000
--- a/gone.sh
+++ /dev/null
@@ -1,2 +0,0 @@
-echo a
-echo b
";
    let parsed = diff::parse(text);
    let file = parsed.get("gone.sh").unwrap();
    assert_eq!(file.status, FileStatus::Deleted);
    assert_eq!(file.new_path, None);
    assert!(!file.is_lintable());
    assert!(file.modified_lines().is_empty());
}

#[test]
fn binary_file_has_no_hunks() {
    let text = "\
diff --git a/logo.png b/logo.png
index 1111111..2222222 100644
Binary files a/logo.png and b/logo.png differ
";
    let parsed = diff::parse(text);
    let file = parsed.get("logo.png").unwrap();
    assert_eq!(file.status, FileStatus::Binary);
    assert!(file.hunks.is_empty());
    assert!(!file.is_lintable());
    assert!(file.modified_lines().is_empty());
}

#[test]
fn pure_rename_yields_empty_set_under_new_path() {
    let text = "\
diff --git a/old.sh b/new.sh
similarity index 100%
rename from old.sh
rename to new.sh
";
    let parsed = diff::parse(text);
    assert!(parsed.get("old.sh").is_none());
    let file = parsed.get("new.sh").unwrap();
    assert_eq!(file.status, FileStatus::Renamed);
    assert_eq!(file.old_path.as_deref(), Some("old.sh"));
    assert!(file.hunks.is_empty());
    assert!(file.modified_lines().is_empty());
}

#[test]
fn rename_with_edits_tracks_new_path() {
    let text = "\
diff --git a/scripts/old.sh b/scripts/new.sh
similarity index 90%
rename from scripts/old.sh
rename to scripts/new.sh
index abc1234..def5678 100644
--- a/scripts/old.sh
+++ b/scripts/new.sh
@@ -1,2 +1,3 @@
 #!/bin/sh
+set -eu
 echo hi
";
    let parsed = diff::parse(text);
    let file = parsed.get("scripts/new.sh").unwrap();
    assert_eq!(file.status, FileStatus::Renamed);
    assert_eq!(lines_of(&parsed, "scripts/new.sh"), vec![2]);
}

#[test]
fn mode_change_only_is_modified_without_hunks() {
    let text = "\
diff --git a/tool.sh b/tool.sh
old mode 100644
new mode 100755
";
    let parsed = diff::parse(text);
    let file = parsed.get("tool.sh").unwrap();
    assert_eq!(file.status, FileStatus::Modified);
    assert!(file.modified_lines().is_empty());
}

// ── paths ─────────────────────────────────────────────────────────────────────

#[test]
fn paths_with_spaces_unquoted_and_quoted() {
    let text = "\
diff --git a/my script.sh b/my script.sh
--- a/my script.sh
+++ b/my script.sh
@@ -1,0 +2,1 @@
+echo one
diff --git \"a/other dir/t\\303\\251st.sh\" \"b/other dir/t\\303\\251st.sh\"
--- \"a/other dir/t\\303\\251st.sh\"
+++ \"b/other dir/t\\303\\251st.sh\"
@@ -1,0 +2,1 @@
+echo two
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "my script.sh"), vec![2]);
    assert_eq!(lines_of(&parsed, "other dir/tést.sh"), vec![2]);
}

#[test]
fn plain_unified_diff_without_git_header() {
    let text = "\
--- deploy.sh.orig\t2024-01-01 00:00:00.000000000 +0000
+++ deploy.sh\t2024-01-02 00:00:00.000000000 +0000
@@ -1,2 +1,3 @@
 a
+b
 c
--- lib.sh\t2024-01-01 00:00:00.000000000 +0000
+++ lib.sh\t2024-01-02 00:00:00.000000000 +0000
@@ -5,1 +5,2 @@
 x
+y
";
    let parsed = diff::parse(text);
    assert_eq!(parsed.len(), 2);
    assert_eq!(lines_of(&parsed, "deploy.sh"), vec![2]);
    assert_eq!(lines_of(&parsed, "lib.sh"), vec![6]);
}

#[test]
fn files_keep_diff_order() {
    let text = "\
diff --git a/z.sh b/z.sh
--- a/z.sh
+++ b/z.sh
@@ -1,0 +1,1 @@
+z
diff --git a/a.sh b/a.sh
--- a/a.sh
+++ b/a.sh
@@ -1,0 +1,1 @@
+a
";
    let parsed = diff::parse(text);
    let paths: Vec<&str> = parsed.files().iter().map(|f| f.path()).collect();
    assert_eq!(paths, vec!["z.sh", "a.sh"]);

    let modified = parsed.modified_lines();
    let order: Vec<&str> = modified.paths().collect();
    assert_eq!(order, vec!["z.sh", "a.sh"]);
    assert_eq!(modified.position("a.sh"), Some(1));
}

// ── error handling ────────────────────────────────────────────────────────────

#[test]
fn empty_diff_parses_to_empty_mapping() {
    let parsed = diff::parse("");
    assert!(parsed.is_empty());
    assert!(parsed.warnings.is_empty());
    assert!(parsed.modified_lines().is_empty());
}

#[test]
fn malformed_hunk_header_skips_only_that_file() {
    let text = "\
diff --git a/bad.sh b/bad.sh
--- a/bad.sh
+++ b/bad.sh
@@ -x,1 +y,2 @@
+echo 1
+echo 2
diff --git a/good.sh b/good.sh
--- a/good.sh
+++ b/good.sh
@@ -1,0 +1,1 @@
+echo ok
";
    let parsed = diff::parse(text);
    assert!(parsed.get("bad.sh").is_none());
    assert_eq!(lines_of(&parsed, "good.sh"), vec![1]);
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].stage, Stage::Diff);
    assert_eq!(parsed.warnings[0].file.as_deref(), Some("bad.sh"));
}

#[test]
fn truncated_hunk_warns_but_keeps_lines() {
    let text = "\
diff --git a/short.sh b/short.sh
--- a/short.sh
+++ b/short.sh
@@ -1,1 +1,4 @@
 a
+b
diff --git a/next.sh b/next.sh
--- a/next.sh
+++ b/next.sh
@@ -1,0 +1,1 @@
+n
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "short.sh"), vec![2]);
    assert_eq!(lines_of(&parsed, "next.sh"), vec![1]);
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].message.contains("ended early"));
}

#[test]
fn lines_past_the_declared_counts_are_ignored_with_a_warning() {
    let text = "\
diff --git a/x.sh b/x.sh
--- a/x.sh
+++ b/x.sh
@@ -1,1 +1,2 @@
 a
+b
+c
diff --git a/y.sh b/y.sh
--- a/y.sh
+++ b/y.sh
@@ -1,0 +1,1 @@
+y
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "x.sh"), vec![2]);
    assert_eq!(lines_of(&parsed, "y.sh"), vec![1]);
    assert_eq!(parsed.warnings.len(), 1);
    assert_eq!(parsed.warnings[0].file.as_deref(), Some("x.sh"));
    assert!(parsed.warnings[0].message.contains("1 more line(s)"));
}

#[test]
fn format_patch_signature_is_not_extra_hunk_content() {
    let text = "\
diff --git a/x.sh b/x.sh
--- a/x.sh
+++ b/x.sh
@@ -1,1 +1,2 @@
 a
+b
--\x20
2.40.0
";
    let parsed = diff::parse(text);
    assert_eq!(lines_of(&parsed, "x.sh"), vec![2]);
    assert!(parsed.warnings.is_empty());
}

#[test]
fn hunk_range_past_usize_is_malformed() {
    let text = "\
diff --git a/big.sh b/big.sh
--- a/big.sh
+++ b/big.sh
@@ -1 +18446744073709551615,2 @@
+a
+b
diff --git a/ok.sh b/ok.sh
--- a/ok.sh
+++ b/ok.sh
@@ -1,0 +1,1 @@
+ok
";
    let parsed = diff::parse(text);
    assert!(parsed.get("big.sh").is_none());
    assert_eq!(lines_of(&parsed, "ok.sh"), vec![1]);
    assert_eq!(parsed.warnings.len(), 1);
    assert!(parsed.warnings[0].message.contains("malformed hunk header"));
}

#[test]
fn parsing_is_idempotent() {
    let text = "\
diff --git a/a.sh b/a.sh
--- a/a.sh
+++ b/a.sh
@@ -1,2 +1,3 @@
 a
+b
 c
diff --git a/old.sh b/new.sh
similarity index 100%
rename from old.sh
rename to new.sh
";
    assert_eq!(diff::parse(text), diff::parse(text));
}

// ── context policy ────────────────────────────────────────────────────────────

#[test]
fn context_radius_widens_the_set_within_a_hunk() {
    let text = "\
diff --git a/a.sh b/a.sh
--- a/a.sh
+++ b/a.sh
@@ -1,4 +1,5 @@
 one
 two
+three
 four
 five
";
    let parsed = diff::parse(text);
    let file = parsed.get("a.sh").unwrap();
    assert_eq!(file.modified_lines().iter().collect::<Vec<_>>(), vec![3]);
    assert_eq!(
        file.modified_lines_with_context(1).iter().collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
}

#[test]
fn modified_set_matches_added_lines_exactly() {
    let text = "\
diff --git a/mix.sh b/mix.sh
--- a/mix.sh
+++ b/mix.sh
@@ -1,6 +1,7 @@
 a
-b
+B
 c
-d
 e
+f
+g
 h
";
    let parsed = diff::parse(text);
    let file = parsed.get("mix.sh").unwrap();
    let added: Vec<usize> = file
        .hunks
        .iter()
        .flat_map(|h| h.lines.iter())
        .filter(|l| l.kind == LineKind::Added)
        .filter_map(|l| l.new_line)
        .collect();
    assert_eq!(added, vec![2, 5, 6]);
    assert_eq!(file.modified_lines().iter().collect::<Vec<_>>(), added);
}
