// Program description loader (YAML, JSON or TOML)

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Program, ProgramClass};

/// Serialized form of a program as produced by a front end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramDescription {
    #[serde(default)]
    pub classes: Vec<ProgramClass>,
}

impl ProgramDescription {
    pub fn into_program(self) -> Result<Program> {
        Program::new(self.classes).into_diagnostic()
    }
}

impl Program {
    /// Load a program description from a file, choosing the format by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read program description: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let description: ProgramDescription = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML program description")?,
            "json" => serde_json::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse JSON program description")?,
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML program description")?,
            _ => {
                // Try YAML first (JSON is a subset), then TOML
                if let Ok(description) = serde_yaml::from_str(&contents) {
                    description
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse program description")?
                }
            }
        };

        description
            .into_program()
            .wrap_err_with(|| format!("Invalid program description: {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let description: ProgramDescription = serde_yaml::from_str(contents)
            .into_diagnostic()
            .wrap_err("Failed to parse YAML program description")?;
        description.into_program()
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let description: ProgramDescription = serde_json::from_str(contents)
            .into_diagnostic()
            .wrap_err("Failed to parse JSON program description")?;
        description.into_program()
    }

    /// Serializable snapshot of this program
    pub fn to_description(&self) -> ProgramDescription {
        ProgramDescription {
            classes: self.classes().cloned().collect(),
        }
    }
}
