use crate::merger::MergeOutcome;
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// List every renamed member under its group
    show_members: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_members: true }
    }

    pub fn with_members(mut self, show: bool) -> Self {
        self.show_members = show;
        self
    }

    pub fn report(&self, outcome: &MergeOutcome) -> Result<()> {
        print!("{}", self.render(outcome));
        Ok(())
    }

    pub fn render(&self, outcome: &MergeOutcome) -> String {
        let mut out = String::new();

        if outcome.groups.is_empty() {
            let _ = writeln!(out, "{}", "No classes merged.".green().bold());
        } else {
            self.render_groups(outcome, &mut out);
        }

        if !outcome.pinned.is_empty() {
            let _ = writeln!(out, "{}", "Pinned (fragile access across classes):".cyan().bold());
            for unit in &outcome.pinned {
                let names: Vec<String> = unit.classes.iter().map(|c| c.to_string()).collect();
                let _ = writeln!(out, "  {} {}", "•".dimmed(), names.join(", "));
            }
            let _ = writeln!(out);
        }

        if !outcome.ineligible.is_empty() {
            // Group by policy
            let mut by_policy: BTreeMap<&str, Vec<String>> = BTreeMap::new();
            for record in &outcome.ineligible {
                by_policy.entry(record.policy).or_default().push(record.class.to_string());
            }

            let _ = writeln!(out, "{}", "Ineligible:".yellow().bold());
            for (policy, classes) in by_policy {
                let _ = writeln!(out, "  [{}] {}", policy.dimmed(), classes.join(", "));
            }
            let _ = writeln!(out);
        }

        self.render_summary(outcome, &mut out);
        out
    }

    fn render_groups(&self, outcome: &MergeOutcome, out: &mut String) {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}",
            format!(
                "Merged {} classes into {} representatives:",
                outcome.stats.merged_classes, outcome.stats.merge_groups
            )
            .yellow()
            .bold()
        );
        let _ = writeln!(out);

        let methods = outcome.lens.method_mappings();
        let fields = outcome.lens.field_mappings();

        for group in &outcome.groups {
            let _ = writeln!(out, "{}", group.representative.to_string().cyan().bold());
            for retired in &group.retired {
                let _ = writeln!(out, "  {} {}", "←".dimmed(), retired);
            }

            if self.show_members {
                for (from, to) in methods
                    .iter()
                    .filter(|(from, to)| to.holder == group.representative && from.name != to.name)
                {
                    let _ = writeln!(out, "    {} {} {} {}", "method".dimmed(), from, "→".dimmed(), to.name);
                }
                for (from, to) in fields
                    .iter()
                    .filter(|(from, to)| to.holder == group.representative && from.name != to.name)
                {
                    let _ = writeln!(out, "    {} {} {} {}", "field".dimmed(), from, "→".dimmed(), to.name);
                }
            }
            let _ = writeln!(out);
        }
    }

    fn render_summary(&self, outcome: &MergeOutcome, out: &mut String) {
        let stats = &outcome.stats;

        let _ = writeln!(out, "{}", "─".repeat(60).dimmed());
        let _ = writeln!(
            out,
            "Summary: {} merged, {} pinned, {} ineligible of {} program classes",
            stats.merged_classes.to_string().green(),
            stats.pinned_classes.to_string().cyan(),
            stats.ineligible.to_string().yellow(),
            stats.program_classes
        );
        let _ = writeln!(
            out,
            "Graph: {} nodes, {} edges, {} components, {} unresolved references",
            stats.nodes, stats.edges, stats.components, stats.registry.unresolved
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::HorizontalClassMerger;
    use crate::program::{AccessFlags, ClassType, Program, ProgramClass, ProgramMethod, Proto};

    #[test]
    fn test_render_lists_groups_and_renames() {
        colored::control::set_override(false);

        let method = || ProgramMethod::new("run", Proto::void(), AccessFlags::public());
        let program = Program::new(vec![
            ProgramClass::new(ClassType::new("p.A"), AccessFlags::public()).with_method(method()),
            ProgramClass::new(ClassType::new("p.B"), AccessFlags::public()).with_method(method()),
        ])
        .unwrap();
        let outcome = HorizontalClassMerger::default().run(&program).unwrap();

        let text = TerminalReporter::new().render(&outcome);
        assert!(text.contains("Merged 1 classes into 1 representatives:"));
        assert!(text.contains("← p.B"));
        assert!(text.contains("method p.B#run():void → run$1"));
        assert!(text.contains("Summary: 1 merged, 0 pinned, 0 ineligible of 2 program classes"));

        let quiet = TerminalReporter::new().with_members(false).render(&outcome);
        assert!(!quiet.contains("run$1"));
    }

    #[test]
    fn test_render_empty_outcome() {
        colored::control::set_override(false);

        let program = Program::new(vec![]).unwrap();
        let outcome = HorizontalClassMerger::default().run(&program).unwrap();
        let text = TerminalReporter::new().render(&outcome);
        assert!(text.contains("No classes merged."));
    }
}
