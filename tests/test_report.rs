mod common;

use common::{finding, numbered_script, repo, FakeLinter, DEPLOY_DIFF};
use shell_diff_gate::config::Config;
use shell_diff_gate::finding::Severity;
use shell_diff_gate::gate::{run_gate, GateInput, GateRun};
use shell_diff_gate::output::{errorformat, pretty, OutputFormat};
use shell_diff_gate::report;

fn deploy_run(linter: &FakeLinter) -> GateRun {
    let dir = repo(&[("deploy.sh", numbered_script(23).as_str())]);
    let input = GateInput {
        diff_text: DEPLOY_DIFF,
        files: None,
        root: dir.path(),
    };
    run_gate(&input, &Config::default(), linter)
}

fn no_op_run() -> GateRun {
    let dir = repo(&[("README.md", "text\n")]);
    let input = GateInput {
        diff_text: "diff --git a/README.md b/README.md\n--- a/README.md\n+++ b/README.md\n@@ -1,0 +1,1 @@\n+text\n",
        files: None,
        root: dir.path(),
    };
    run_gate(&input, &Config::default(), &FakeLinter::new())
}

// ── errorformat ───────────────────────────────────────────────────────────────

#[test]
fn errorformat_layout() {
    let mut f = finding("lib/x.sh", 7, 3, Severity::Error);
    f.message = "Couldn't parse this\n  test expression.".to_string();
    assert_eq!(
        errorformat::format_finding(&f),
        "lib/x.sh:7:3: error SC2086: Couldn't parse this test expression. [shellcheck/SC2086]"
    );
}

#[test]
fn errorformat_is_one_line_per_finding() {
    let findings = vec![
        finding("a.sh", 1, 1, Severity::Info),
        finding("a.sh", 2, 1, Severity::Style),
    ];
    let text = errorformat::format(&findings);
    assert_eq!(text.lines().count(), 2);
    assert!(text.ends_with('\n'));
    assert_eq!(errorformat::format(&[]), "");
}

// ── build ─────────────────────────────────────────────────────────────────────

#[test]
fn failing_run_report() {
    let linter = FakeLinter::new().with_findings(
        "deploy.sh",
        vec![
            finding("deploy.sh", 10, 1, Severity::Error),
            finding("deploy.sh", 12, 4, Severity::Style),
            finding("deploy.sh", 3, 1, Severity::Error),
        ],
    );
    let run = deploy_run(&linter);
    let built = report::build(&run, OutputFormat::Errorformat);

    assert_eq!(built.exit_code, 1);
    assert_eq!(built.machine.lines().count(), 2);
    assert!(built.human.starts_with("Shell lint on modified lines: failed\n"));
    assert!(built.human.contains(
        "2 issue(s) on modified lines (1 blocking at threshold 'warning'), 3 total before filtering, 1 script(s) linted."
    ));
    assert!(built
        .human
        .contains("deploy.sh:10:1: error SC2086: Double quote to prevent globbing and word splitting. [shellcheck/SC2086]\n    > echo line10\n"));
}

#[test]
fn clean_run_has_empty_machine_report_but_a_summary() {
    let run = deploy_run(&FakeLinter::new());
    let built = report::build(&run, OutputFormat::Errorformat);

    assert_eq!(built.exit_code, 0);
    assert_eq!(built.machine, "");
    assert!(built.human.starts_with("Shell lint on modified lines: clean\n"));
    assert!(built.human.contains("0 issue(s) on modified lines"));
}

#[test]
fn no_op_reports_are_empty() {
    let run = no_op_run();
    let built = report::build(&run, OutputFormat::Errorformat);
    assert_eq!(built, report::Report {
        machine: String::new(),
        human: String::new(),
        exit_code: 0,
    });
}

// ── json ──────────────────────────────────────────────────────────────────────

#[test]
fn json_report_describes_the_run() {
    let linter = FakeLinter::new()
        .with_findings("deploy.sh", vec![finding("deploy.sh", 11, 6, Severity::Warning)]);
    let run = deploy_run(&linter);
    let built = report::build(&run, OutputFormat::Json);
    let doc: serde_json::Value = serde_json::from_str(&built.machine).unwrap();

    assert_eq!(doc["tool"], "shell-diff-gate");
    assert_eq!(doc["status"], "failed");
    assert_eq!(doc["passed"], false);
    assert_eq!(doc["exit_code"], 1);
    assert_eq!(doc["threshold"], "warning");
    assert_eq!(doc["summary"]["files_in_diff"], 1);
    assert_eq!(doc["summary"]["scripts"], 1);
    assert_eq!(doc["summary"]["files_linted"], 1);
    assert_eq!(doc["summary"]["total_after"], 1);
    assert_eq!(doc["summary"]["blocking"], 1);
    assert_eq!(doc["summary"]["warnings"], 1);
    assert_eq!(doc["scripts"][0]["path"], "deploy.sh");
    assert_eq!(doc["findings"][0]["line"], 11);
    assert_eq!(doc["findings"][0]["severity"], "warning");
    assert_eq!(doc["findings"][0]["source_line"], "echo line11");
    assert!(doc["tool_failures"].as_object().unwrap().is_empty());
}

#[test]
fn json_no_op_is_still_a_document() {
    let built = report::build(&no_op_run(), OutputFormat::Json);
    let doc: serde_json::Value = serde_json::from_str(&built.machine).unwrap();
    assert_eq!(doc["status"], "no-op");
    assert_eq!(doc["findings"].as_array().unwrap().len(), 0);
    assert_eq!(built.human, "");
}

#[test]
fn json_lists_tool_failures() {
    let run = deploy_run(&FakeLinter::new().with_failure("deploy.sh"));
    let doc: serde_json::Value =
        serde_json::from_str(&report::build(&run, OutputFormat::Json).machine).unwrap();
    assert_eq!(doc["status"], "indeterminate");
    assert_eq!(doc["tool_failures"]["deploy.sh"]["kind"], "spawn");
    assert_eq!(doc["tool_failures"]["deploy.sh"]["tool"], "fake");
}

// ── sarif ─────────────────────────────────────────────────────────────────────

#[test]
fn sarif_report_structure() {
    let linter = FakeLinter::new().with_findings(
        "deploy.sh",
        vec![
            finding("deploy.sh", 10, 2, Severity::Error),
            finding("deploy.sh", 11, 6, Severity::Style),
        ],
    );
    let run = deploy_run(&linter);
    let built = report::build(&run, OutputFormat::Sarif);
    let doc: serde_json::Value = serde_json::from_str(&built.machine).unwrap();

    assert_eq!(doc["version"], "2.1.0");
    let sarif_run = &doc["runs"][0];
    assert_eq!(sarif_run["tool"]["driver"]["name"], "shell-diff-gate");

    let rules = sarif_run["tool"]["driver"]["rules"].as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["id"], "shellcheck/SC2086");
    assert!(rules[0]["help"]["text"]
        .as_str()
        .unwrap()
        .contains("https://www.shellcheck.net/wiki/SC2086"));

    let results = sarif_run["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["level"], "error");
    assert_eq!(results[1]["level"], "note");
    assert_eq!(results[0]["ruleIndex"], 0);
    let region = &results[1]["locations"][0]["physicalLocation"]["region"];
    assert_eq!(region["startLine"], 11);
    assert_eq!(region["startColumn"], 6);
    assert_eq!(
        results[1]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
        "deploy.sh"
    );
}

// ── terminal ──────────────────────────────────────────────────────────────────

#[test]
fn pretty_output_sections() {
    colored::control::set_override(false);

    let linter = FakeLinter::new()
        .with_findings("deploy.sh", vec![finding("deploy.sh", 11, 6, Severity::Warning)]);
    let text = pretty::format(&deploy_run(&linter));
    assert!(text.contains("Scripts"));
    assert!(text.contains("[LINT] deploy.sh"));
    assert!(text.contains("1 finding(s)"));
    assert!(text.contains("[ WARN] SC2086"));
    assert!(text.contains("deploy.sh:11:6"));
    assert!(text.contains("Result: failed"));

    let skip = pretty::format(&no_op_run());
    assert_eq!(skip, "SKIP no shell scripts among 1 changed file(s)\n");
}
