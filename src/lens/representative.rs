use serde::{Deserialize, Serialize};

use crate::policy::MergeGroup;
use crate::program::{ClassType, Program};

/// Picks the class that survives a merge
pub trait RepresentativeChooser: Sync {
    /// `None` only for an empty group
    fn choose(&self, group: &MergeGroup, program: &Program) -> Option<ClassType>;
}

impl<F> RepresentativeChooser for F
where
    F: Fn(&MergeGroup, &Program) -> Option<ClassType> + Sync,
{
    fn choose(&self, group: &MergeGroup, program: &Program) -> Option<ClassType> {
        self(group, program)
    }
}

/// The first class of the group
pub struct FirstInGroup;

impl RepresentativeChooser for FirstInGroup {
    fn choose(&self, group: &MergeGroup, _program: &Program) -> Option<ClassType> {
        group.classes().first().cloned()
    }
}

/// The class declaring the most fields and methods; ties go to the earliest
pub struct MostMembers;

impl RepresentativeChooser for MostMembers {
    fn choose(&self, group: &MergeGroup, program: &Program) -> Option<ClassType> {
        let mut best: Option<(&ClassType, usize)> = None;
        for class_type in group.classes() {
            let members = program
                .definition_for(class_type)
                .map(|c| c.member_count())
                .unwrap_or(0);
            match best {
                Some((_, most)) if most >= members => {}
                _ => best = Some((class_type, members)),
            }
        }
        best.map(|(class_type, _)| class_type.clone())
    }
}

/// Chooser selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentativeStrategy {
    #[default]
    FirstInGroup,
    MostMembers,
}

impl RepresentativeStrategy {
    pub fn chooser(&self) -> Box<dyn RepresentativeChooser> {
        match self {
            RepresentativeStrategy::FirstInGroup => Box::new(FirstInGroup),
            RepresentativeStrategy::MostMembers => Box::new(MostMembers),
        }
    }
}
