use serde::Serialize;

use crate::graph::Component;
use crate::program::ClassType;

/// Classes that share a component with other classes and therefore stay where they are
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinnedUnit {
    pub classes: Vec<ClassType>,
}

impl PinnedUnit {
    pub fn contains(&self, class_type: &ClassType) -> bool {
        self.classes.contains(class_type)
    }
}

/// Components split into mergeable classes and pinned units
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeCandidates {
    /// Classes whose component touches no other class, in component order
    pub candidates: Vec<ClassType>,
    pub pinned: Vec<PinnedUnit>,
}

impl MergeCandidates {
    /// A component touching exactly one class makes that class a candidate; a component
    /// touching several is pinned as a whole
    pub fn from_components(components: &[Component]) -> Self {
        let mut result = Self::default();

        for component in components {
            let classes = component.classes();
            match classes.len() {
                0 => {}
                1 => result.candidates.extend(classes),
                _ => result.pinned.push(PinnedUnit {
                    classes: classes.into_iter().collect(),
                }),
            }
        }

        result
    }

    pub fn is_pinned(&self, class_type: &ClassType) -> bool {
        self.pinned.iter().any(|unit| unit.contains(class_type))
    }

    pub fn pinned_class_count(&self) -> usize {
        self.pinned.iter().map(|unit| unit.classes.len()).sum()
    }
}
