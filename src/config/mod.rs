// Configuration for the class merging pass

mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::lens::RepresentativeStrategy;
use crate::policy::{PolicyChain, PolicyKind};
use crate::program::ClassType;
use crate::report::ReportFormat;

/// Configuration for one horizontal class merging pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Constraint graph construction
    pub graph: GraphConfig,

    /// Policy chain
    pub policies: PolicyConfig,

    /// Rewrite lens production
    pub lens: LensConfig,

    /// Report configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Scan classes on the rayon pool
    pub parallel: bool,

    /// Class patterns that get no nodes (never merged, never pinned)
    pub exclude_packages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Policy phases, applied in order
    pub phases: Vec<Vec<PolicyKind>>,

    /// Class patterns that must never be merged
    pub keep: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// How the surviving class of each group is picked
    pub representative: RepresentativeStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json
    pub format: ReportFormat,

    /// Write the report here instead of stdout
    pub output: Option<PathBuf>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            exclude_packages: vec![],
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            phases: PolicyChain::default_phases(),
            keep: vec![],
        }
    }
}

impl GraphConfig {
    /// Whether a class gets nodes in the constraint graph
    pub fn tracks(&self, class_type: &ClassType) -> bool {
        !self
            .exclude_packages
            .iter()
            .any(|pattern| glob_match(pattern, class_type.name()))
    }
}

impl PolicyConfig {
    /// Build the policy chain these phases describe
    pub fn chain(&self) -> PolicyChain {
        PolicyChain::from_kinds(&self.phases, self.keep.clone())
    }
}

/// Simple glob matching over qualified class names.
///
/// Supports "*Suffix", "Prefix*", "com.example.**" (package and all subpackages),
/// "com.example.*" (classes directly in the package) and exact names.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }

    // Package patterns like "com.example.**"
    if let Some(package) = pattern.strip_suffix(".**") {
        return text.len() > package.len() && text.starts_with(package) && text[package.len()..].starts_with('.');
    }

    // Package patterns like "com.example.*" match one level only
    if let Some(package) = pattern.strip_suffix(".*") {
        return match text.rfind('.') {
            Some(dot) => &text[..dot] == package,
            None => false,
        };
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        // Pattern like "*Test" matches "com.example.FooTest"
        return text.ends_with(suffix);
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        // Pattern like "com.example.Gen*" matches "com.example.Generated"
        return text.starts_with(prefix);
    }

    // Exact match
    text == pattern
}
