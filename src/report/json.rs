use crate::merger::{MergeOutcome, MergeStats};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn render(&self, outcome: &MergeOutcome) -> Result<String> {
        let report = JsonReport::from_outcome(outcome);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }

    pub fn report(&self, outcome: &MergeOutcome) -> Result<()> {
        let json = self.render(outcome)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report: {}", path.display()))?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total_merged: usize,
    groups: Vec<JsonGroup>,
    pinned: Vec<Vec<String>>,
    ineligible: Vec<JsonIneligible>,
    summary: MergeStats,
}

#[derive(Serialize)]
struct JsonGroup {
    representative: String,
    retired: Vec<String>,
    members_renamed: usize,
}

#[derive(Serialize)]
struct JsonIneligible {
    class: String,
    policy: &'static str,
}

impl JsonReport {
    fn from_outcome(outcome: &MergeOutcome) -> Self {
        let methods = outcome.lens.method_mappings();
        let fields = outcome.lens.field_mappings();

        let groups = outcome
            .groups
            .iter()
            .map(|group| {
                // Members whose name changed on the way to the representative
                let renamed_methods = methods
                    .iter()
                    .filter(|(from, to)| to.holder == group.representative && from.name != to.name)
                    .count();
                let renamed_fields = fields
                    .iter()
                    .filter(|(from, to)| to.holder == group.representative && from.name != to.name)
                    .count();

                JsonGroup {
                    representative: group.representative.to_string(),
                    retired: group.retired.iter().map(|c| c.to_string()).collect(),
                    members_renamed: renamed_methods + renamed_fields,
                }
            })
            .collect();

        Self {
            version: "1.0",
            total_merged: outcome.stats.merged_classes,
            groups,
            pinned: outcome
                .pinned
                .iter()
                .map(|unit| unit.classes.iter().map(|c| c.to_string()).collect())
                .collect(),
            ineligible: outcome
                .ineligible
                .iter()
                .map(|i| JsonIneligible {
                    class: i.class.to_string(),
                    policy: i.policy,
                })
                .collect(),
            summary: outcome.stats,
        }
    }
}
