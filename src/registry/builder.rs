use tracing::debug;

use super::{scan_class, RegistryStats};
use crate::config::GraphConfig;
use crate::graph::{ConstraintGraph, GraphError};
use crate::oracle::AccessOracles;
use crate::program::{Program, ProgramClass};

/// Builder for constructing the constraint graph one class at a time
pub struct GraphBuilder<'a, O: AccessOracles + ?Sized> {
    /// The graph being built
    graph: ConstraintGraph,

    oracles: &'a O,

    /// Counters over every class processed so far
    stats: RegistryStats,
}

impl<'a, O: AccessOracles + ?Sized> GraphBuilder<'a, O> {
    /// Create the builder with one node per tracked element of `program`
    pub fn new(oracles: &'a O, program: &Program, config: &GraphConfig) -> Self {
        Self {
            graph: ConstraintGraph::for_program(program, |class| config.tracks(&class.class_type)),
            oracles,
            stats: RegistryStats::default(),
        }
    }

    /// Scan a class and add the edges its accesses impose.
    ///
    /// Classes without a node are skipped: nothing they access can be relocated with them.
    pub fn process_class(&mut self, class: &ProgramClass) -> Result<(), GraphError> {
        if !self.graph.contains(&class.element()) {
            debug!("Skipping untracked class: {}", class.class_type);
            return Ok(());
        }

        let stats = scan_class(self.oracles, &self.graph, class)?;
        debug!(
            "Scanned {}: {} uses, {} new edges",
            class.class_type, stats.uses, stats.edges
        );
        self.stats += stats;
        Ok(())
    }

    pub fn graph(&self) -> &ConstraintGraph {
        &self.graph
    }

    /// Finish building and return the graph
    pub fn build(self) -> (ConstraintGraph, RegistryStats) {
        (self.graph, self.stats)
    }
}
