use crate::finding::{Finding, Severity};
use crate::gate::GateRun;
use crate::lint::shellcheck::wiki_url;
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation, Region,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};
use std::collections::{BTreeMap, HashMap};

pub fn format(run: &GateRun) -> String {
    let findings = &run.filter.retained;

    // Unique rules, sorted by id.
    let mut rule_map: BTreeMap<&str, &Finding> = BTreeMap::new();
    for f in findings {
        rule_map.entry(f.rule_id.as_str()).or_insert(f);
    }

    let rule_index: HashMap<&str, i64> = rule_map
        .keys()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = rule_map
        .iter()
        .map(|(id, f)| {
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            rule.short_description = Some(
                MultiformatMessageString::builder()
                    .text(f.message.clone())
                    .build(),
            );
            if id.starts_with("shellcheck/") {
                rule.help = Some(
                    MultiformatMessageString::builder()
                        .text(format!("See {}", wiki_url(&f.code)))
                        .build(),
                );
            }
            rule
        })
        .collect();

    let results: Vec<SarifResult> = findings
        .iter()
        .map(|f| {
            let level = match f.severity {
                Severity::Error => ResultLevel::Error,
                Severity::Warning => ResultLevel::Warning,
                Severity::Info | Severity::Style => ResultLevel::Note,
            };

            let mut result = SarifResult::builder()
                .message(Message::builder().text(f.message.clone()).build())
                .build();

            result.rule_id = Some(f.rule_id.clone());
            result.level = Some(level);
            result.rule_index = rule_index.get(f.rule_id.as_str()).copied();

            let mut region = Region::builder().start_line(f.line as i64).build();
            region.start_column = Some(f.column as i64);

            let mut physical = PhysicalLocation::builder().build();
            physical.artifact_location = Some(
                ArtifactLocation::builder()
                    .uri(f.file.replace('\\', "/"))
                    .build(),
            );
            physical.region = Some(region);

            let mut location = Location::builder().build();
            location.physical_location = Some(physical);
            result.locations = Some(vec![location]);

            result
        })
        .collect();

    let driver = ToolComponent::builder()
        .name(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let sarif_run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![sarif_run]).build();

    serde_json::to_string_pretty(&sarif).expect("SARIF serialization failed") + "\n"
}
