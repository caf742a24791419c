mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::merger::MergeOutcome;
use miette::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for outputting merge decisions
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn from_config(config: &crate::config::ReportConfig) -> Self {
        Self::new(config.format, config.output.clone())
    }

    /// Report the outcome of a merging pass
    pub fn report(&self, outcome: &MergeOutcome) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new();
                reporter.report(outcome)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(outcome)
            }
        }
    }
}
