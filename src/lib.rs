//! classmerge - Horizontal class merging for JVM/Android programs
//!
//! This library decides which sibling classes can be merged into one without breaking any
//! access that depends on package placement, and produces the rewrite lens that maps every
//! reference from the pre-merge program to the post-merge program.
//!
//! # Architecture
//!
//! A merging pass consists of:
//! 1. **Program model** - classes, members and the uses in their code
//! 2. **Access oracles** - resolution, subtyping and protected-access queries
//! 3. **Use registry** - record fragile accesses as edges in the constraint graph
//! 4. **Components** - elements connected by edges move or stay together
//! 5. **Policy chain** - split the candidates into merge groups
//! 6. **Rewrite lens** - pick representatives and map retired classes and members
//! 7. **Reporting** - Output results in various formats

pub mod config;
pub mod graph;
pub mod lens;
pub mod merger;
pub mod oracle;
pub mod policy;
pub mod program;
pub mod registry;
pub mod report;

pub use config::MergeConfig;
pub use graph::{Component, ConstraintGraph, GraphError, NodeRef};
pub use lens::{produce_lens, LensBuilder, LensError, RepresentativeChooser, RewriteLens};
pub use merger::{HorizontalClassMerger, MergeError, MergeOutcome};
pub use oracle::AppInfo;
pub use policy::{apply_policy_chain, MergePolicy, PolicyChain, PolicyKind};
pub use program::{ClassType, ElementId, Program, ProgramClass};
pub use registry::{build_constraint_graph, RegistryStats, UseRegistry};
pub use report::{ReportFormat, Reporter};
