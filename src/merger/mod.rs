//! Horizontal class merger - drives one merging pass end to end
//!
//! The pass runs in five steps:
//! 1. **Graph building** - scan every tracked class with the use registry
//! 2. **Components** - partition the constraint graph
//! 3. **Candidates** - single-class components are candidates, the rest are pinned
//! 4. **Policy chain** - refine the candidates into merge groups
//! 5. **Lens** - choose representatives and map retired classes and their members

mod candidates;

pub use candidates::{MergeCandidates, PinnedUnit};
pub use crate::lens::MergedGroup;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MergeConfig;
use crate::graph::GraphError;
use crate::lens::{produce_lens, LensError, RepresentativeChooser, RewriteLens};
use crate::oracle::AppInfo;
use crate::policy::{apply_policy_chain, Ineligibility, MergeGroup, PolicyChain, PolicyContext};
use crate::program::{ClassType, Program};
use crate::registry::{build_constraint_graph, RegistryStats};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("constraint graph: {0}")]
    Graph(#[from] GraphError),

    #[error("rewrite lens: {0}")]
    Lens(#[from] LensError),
}

/// Counters describing one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub program_classes: usize,
    pub nodes: usize,
    pub edges: usize,
    pub components: usize,
    pub candidates: usize,
    pub pinned_classes: usize,
    pub ineligible: usize,
    pub merge_groups: usize,
    pub merged_classes: usize,
    pub registry: RegistryStats,
}

/// Everything a merging pass decided
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub groups: Vec<MergedGroup>,
    pub pinned: Vec<PinnedUnit>,
    pub ineligible: Vec<Ineligibility>,
    pub stats: MergeStats,
    pub lens: RewriteLens,
}

impl MergeOutcome {
    /// Whether `class_type` disappears into another class
    pub fn is_merged(&self, class_type: &ClassType) -> bool {
        self.groups.iter().any(|g| g.retired.contains(class_type))
    }

    /// The class that `class_type` ends up as
    pub fn representative_of(&self, class_type: &ClassType) -> ClassType {
        self.lens.class_type(class_type)
    }

    pub fn is_pinned(&self, class_type: &ClassType) -> bool {
        self.pinned.iter().any(|unit| unit.contains(class_type))
    }
}

/// Runs horizontal class merging over a program
pub struct HorizontalClassMerger {
    config: MergeConfig,
    /// Overrides the chain built from configuration
    chain: Option<PolicyChain>,
    /// Overrides the representative strategy from configuration
    chooser: Option<Box<dyn RepresentativeChooser>>,
}

impl HorizontalClassMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            chain: None,
            chooser: None,
        }
    }

    pub fn with_chain(mut self, chain: PolicyChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_chooser(mut self, chooser: Box<dyn RepresentativeChooser>) -> Self {
        self.chooser = Some(chooser);
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    pub fn run(&self, program: &Program) -> Result<MergeOutcome, MergeError> {
        let app_info = AppInfo::new(program);

        info!(
            "Building constraint graph for {} program classes...",
            program.program_class_count()
        );
        let (graph, registry) = build_constraint_graph(program, &app_info, &self.config.graph)?;

        let components = graph.connected_components();
        let candidates = MergeCandidates::from_components(&components);
        info!(
            "{} components: {} merge candidates, {} pinned units",
            components.len(),
            candidates.candidates.len(),
            candidates.pinned.len()
        );

        let built_chain;
        let chain = match &self.chain {
            Some(chain) => chain,
            None => {
                built_chain = self.config.policies.chain();
                &built_chain
            }
        };
        let ctx = PolicyContext::new(program, &app_info);
        let initial = vec![MergeGroup::new(candidates.candidates.clone())];
        let refined = apply_policy_chain(initial, chain, &ctx);
        for group in refined.mergeable_groups() {
            debug!("Merge group of {}: {:?}", group.len(), group.classes());
        }

        let built_chooser;
        let chooser: &dyn RepresentativeChooser = match &self.chooser {
            Some(chooser) => chooser.as_ref(),
            None => {
                built_chooser = self.config.lens.representative.chooser();
                built_chooser.as_ref()
            }
        };
        let (lens, groups) = produce_lens(&refined.groups, program, chooser)?;

        let stats = MergeStats {
            program_classes: program.program_class_count(),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            components: components.len(),
            candidates: candidates.candidates.len(),
            pinned_classes: candidates.pinned_class_count(),
            ineligible: refined.ineligible.len(),
            merge_groups: groups.len(),
            merged_classes: groups.iter().map(|g| g.retired.len()).sum(),
            registry,
        };

        info!(
            "Merged {} classes into {} representatives",
            stats.merged_classes, stats.merge_groups
        );

        Ok(MergeOutcome {
            groups,
            pinned: candidates.pinned,
            ineligible: refined.ineligible,
            stats,
            lens,
        })
    }
}

impl Default for HorizontalClassMerger {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}
