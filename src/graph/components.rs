// Connected components - the atomic units that must move or merge together
//
// Uses union-find over the undirected edges, so the partition does not depend on the
// order in which edges were inserted. Components are ordered by their smallest node index
// (the first-registered element); members within a component by node index.

use petgraph::unionfind::UnionFind;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::ConstraintGraph;
use crate::program::{ClassType, ElementId};

/// A maximal set of elements connected by constraint edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Members in node-index order
    elements: Vec<ElementId>,
}

impl Component {
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, element: &ElementId) -> bool {
        self.elements.contains(element)
    }

    /// Classes touched by this component; members count for their holder
    pub fn classes(&self) -> BTreeSet<ClassType> {
        self.elements.iter().map(|e| e.holder().clone()).collect()
    }

    /// The component's first element, its representative for ordering
    pub fn representative(&self) -> Option<&ElementId> {
        self.elements.first()
    }
}

impl ConstraintGraph {
    /// Partition all tracked nodes into maximal connected groups.
    ///
    /// Call once the graph is fully built; the graph is read-only from then on.
    pub fn connected_components(&self) -> Vec<Component> {
        let node_count = self.node_count();
        let mut union_find: UnionFind<usize> = UnionFind::new(node_count);

        for (low, high) in self.edges() {
            union_find.union(low, high);
        }

        let mut component_of_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Component> = Vec::new();

        for index in 0..node_count {
            let root = union_find.find_mut(index);
            let slot = *component_of_root.entry(root).or_insert_with(|| {
                components.push(Component { elements: Vec::new() });
                components.len() - 1
            });
            components[slot].elements.push(self.element_at(index).clone());
        }

        debug!(
            "{} nodes, {} edges, {} components",
            node_count,
            self.edge_count(),
            components.len()
        );

        components
    }

    /// Whether two elements ended up in the same component
    pub fn same_component(&self, a: &ElementId, b: &ElementId) -> bool {
        let (Some(a), Some(b)) = (self.node(a), self.node(b)) else {
            return false;
        };

        let mut union_find: UnionFind<usize> = UnionFind::new(self.node_count());
        for (low, high) in self.edges() {
            union_find.union(low, high);
        }
        union_find.equiv(a.index(), b.index())
    }
}
