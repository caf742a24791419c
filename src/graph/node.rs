use std::fmt;
use std::hash::{Hash, Hasher};

use super::{ConstraintGraph, GraphError, GraphId};
use crate::program::ElementId;

/// Handle to one node of a [`ConstraintGraph`].
///
/// Two handles are equal when they point at the same node of the same graph; since a graph
/// holds at most one node per element, this is equality by wrapped element.
#[derive(Clone, Copy)]
pub struct NodeRef<'g> {
    pub(super) graph: &'g ConstraintGraph,
    pub(super) index: usize,
}

impl<'g> NodeRef<'g> {
    /// The program element this node stands for
    pub fn element(&self) -> &'g ElementId {
        self.graph.element_at(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn graph_id(&self) -> GraphId {
        self.graph.id()
    }

    /// Add a symmetric "must stay together" edge.
    ///
    /// Idempotent. Returns whether the edge is new. Fails if `other` belongs to another graph.
    pub fn add_neighbor(&self, other: NodeRef<'_>) -> Result<bool, GraphError> {
        self.graph.add_edge(*self, other)
    }

    /// Adjacent nodes, ordered by index
    pub fn neighbors(&self) -> Vec<NodeRef<'g>> {
        self.graph
            .neighbor_indices(self.index)
            .into_iter()
            .map(|index| NodeRef {
                graph: self.graph,
                index,
            })
            .collect()
    }

    pub fn degree(&self) -> usize {
        self.graph.neighbor_indices(self.index).len()
    }

    pub fn is_adjacent(&self, other: &NodeRef<'_>) -> bool {
        other.graph_id() == self.graph_id() && self.graph.neighbor_indices(self.index).contains(&other.index)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.graph_id() == other.graph_id() && self.index == other.index
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph_id().hash(state);
        self.index.hash(state);
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("graph", &self.graph_id())
            .field("index", &self.index)
            .field("element", self.element())
            .finish()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.element().kind_name(), self.element())
    }
}
