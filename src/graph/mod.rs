// Constraint graph - undirected "must stay together" edges between program elements

mod components;
mod node;

pub use components::Component;
pub use node::NodeRef;

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;

use crate::program::{ElementId, Program, ProgramClass};

static NEXT_GRAPH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one graph instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph#{}", self.0)
    }
}

/// Invariant violations while building a graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {node} belongs to {found}, not to {expected}")]
    ForeignNode {
        node: String,
        expected: GraphId,
        found: GraphId,
    },
}

/// The constraint graph for one analysis pass.
///
/// Nodes are created up front, one per tracked element; edges only accumulate. Edge insertion
/// takes `&self` and may run on many threads at once.
pub struct ConstraintGraph {
    id: GraphId,

    /// Element of each node, by node index
    elements: Vec<ElementId>,

    /// Map from element to node index
    node_map: HashMap<ElementId, usize>,

    /// Adjacency set of each node, by node index
    adjacency: Vec<Mutex<BTreeSet<usize>>>,

    edge_count: AtomicUsize,
}

impl ConstraintGraph {
    /// Create a graph with one node per distinct element; the first occurrence fixes the index
    pub fn new<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = ElementId>,
    {
        let mut unique = Vec::new();
        let mut node_map = HashMap::new();
        for element in elements {
            if node_map.contains_key(&element) {
                continue;
            }
            node_map.insert(element.clone(), unique.len());
            unique.push(element);
        }

        let adjacency = (0..unique.len()).map(|_| Mutex::new(BTreeSet::new())).collect();

        Self {
            id: GraphId(NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed)),
            elements: unique,
            node_map,
            adjacency,
            edge_count: AtomicUsize::new(0),
        }
    }

    /// Track every program class accepted by `filter`, together with its fields and methods
    pub fn for_program<F>(program: &Program, filter: F) -> Self
    where
        F: Fn(&ProgramClass) -> bool,
    {
        Self::new(
            program
                .program_classes()
                .filter(|class| filter(class))
                .flat_map(|class| class.elements()),
        )
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Node for a tracked element; `None` means "not a candidate, add no edge"
    pub fn node(&self, element: &ElementId) -> Option<NodeRef<'_>> {
        self.node_map.get(element).map(|&index| NodeRef { graph: self, index })
    }

    pub fn contains(&self, element: &ElementId) -> bool {
        self.node_map.contains_key(element)
    }

    /// All nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.elements.len()).map(move |index| NodeRef { graph: self, index })
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn node_count(&self) -> usize {
        self.elements.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count.load(Ordering::Acquire)
    }

    /// Add a symmetric edge between two nodes of this graph.
    ///
    /// Returns whether the edge is new. Self-edges are ignored.
    pub fn add_edge(&self, a: NodeRef<'_>, b: NodeRef<'_>) -> Result<bool, GraphError> {
        self.check_owned(&a)?;
        self.check_owned(&b)?;

        if a.index == b.index {
            return Ok(false);
        }

        // The lower-index half decides whether the edge is new, so that concurrent
        // insertions of (a, b) and (b, a) count it once
        let (low, high) = if a.index < b.index {
            (a.index, b.index)
        } else {
            (b.index, a.index)
        };

        let inserted = self.adjacency[low].lock().insert(high);
        self.adjacency[high].lock().insert(low);

        if inserted {
            self.edge_count.fetch_add(1, Ordering::AcqRel);
        }
        Ok(inserted)
    }

    /// Add an edge between two elements if both are tracked
    pub fn connect(&self, a: &ElementId, b: &ElementId) -> Result<bool, GraphError> {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => self.add_edge(a, b),
            _ => Ok(false),
        }
    }

    pub fn contains_edge(&self, a: &ElementId, b: &ElementId) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => a.is_adjacent(&b),
            _ => false,
        }
    }

    /// All edges as (lower index, higher index) pairs, sorted
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (index, adjacency) in self.adjacency.iter().enumerate() {
            edges.extend(adjacency.lock().iter().filter(|&&n| n > index).map(|&n| (index, n)));
        }
        edges
    }

    pub(crate) fn element_at(&self, index: usize) -> &ElementId {
        &self.elements[index]
    }

    pub(crate) fn neighbor_indices(&self, index: usize) -> Vec<usize> {
        self.adjacency[index].lock().iter().copied().collect()
    }

    fn check_owned(&self, node: &NodeRef<'_>) -> Result<(), GraphError> {
        if node.graph_id() == self.id {
            Ok(())
        } else {
            Err(GraphError::ForeignNode {
                node: node.element().to_string(),
                expected: self.id,
                found: node.graph_id(),
            })
        }
    }
}

impl fmt::Debug for ConstraintGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintGraph")
            .field("id", &self.id)
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
