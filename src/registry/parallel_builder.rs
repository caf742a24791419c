// Parallel graph builder using rayon

use rayon::prelude::*;
use tracing::info;

use super::{scan_class, RegistryStats};
use crate::config::GraphConfig;
use crate::graph::{ConstraintGraph, GraphError};
use crate::oracle::AccessOracles;
use crate::program::{Program, ProgramClass};

/// Parallel graph builder for large programs.
///
/// Classes are scanned concurrently against one shared graph. Edge insertion is
/// synchronized per node, so the resulting edge set matches a sequential build.
pub struct ParallelGraphBuilder<'a, O: AccessOracles + ?Sized> {
    oracles: &'a O,
}

impl<'a, O: AccessOracles + ?Sized> ParallelGraphBuilder<'a, O> {
    pub fn new(oracles: &'a O) -> Self {
        Self { oracles }
    }

    /// Build the graph for every tracked program class
    pub fn build_from_program(
        &self,
        program: &Program,
        config: &GraphConfig,
    ) -> Result<(ConstraintGraph, RegistryStats), GraphError> {
        let graph = ConstraintGraph::for_program(program, |class| config.tracks(&class.class_type));
        let classes: Vec<&ProgramClass> = program
            .program_classes()
            .filter(|class| graph.contains(&class.element()))
            .collect();

        info!("Scanning {} classes in parallel...", classes.len());

        let results: Vec<Result<RegistryStats, GraphError>> = classes
            .par_iter()
            .map(|class| scan_class(self.oracles, &graph, class))
            .collect();

        let mut stats = RegistryStats::default();
        for result in results {
            stats += result?;
        }

        info!(
            "Built constraint graph: {} nodes, {} edges, {} unresolved references",
            graph.node_count(),
            graph.edge_count(),
            stats.unresolved
        );

        Ok((graph, stats))
    }
}
