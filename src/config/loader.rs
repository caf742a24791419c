use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;
use tracing::debug;

use super::MergeConfig;

impl MergeConfig {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to parse YAML config: {}", path.display())),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to parse TOML config: {}", path.display())),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".classmerge.yml",
            ".classmerge.yaml",
            ".classmerge.toml",
            "classmerge.yml",
            "classmerge.yaml",
            "classmerge.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }
}
