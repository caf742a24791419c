// Policy chain - refines candidate groups phase by phase

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::{KeyResult, MergeKey, MergePolicy, PolicyContext, PolicyKind};
use crate::program::ClassType;

/// A set of classes that may be merged into one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeGroup {
    classes: Vec<ClassType>,
}

impl MergeGroup {
    pub fn new(classes: Vec<ClassType>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[ClassType] {
        &self.classes
    }

    pub fn into_classes(self) -> Vec<ClassType> {
        self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, class_type: &ClassType) -> bool {
        self.classes.contains(class_type)
    }
}

/// A class removed from grouping and the policy that removed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ineligibility {
    pub class: ClassType,
    pub policy: &'static str,
}

/// Policies evaluated together on the same input groups
pub struct PolicyPhase {
    policies: Vec<Box<dyn MergePolicy>>,
}

impl PolicyPhase {
    pub fn new(policies: Vec<Box<dyn MergePolicy>>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[Box<dyn MergePolicy>] {
        &self.policies
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }
}

/// Ordered policy phases
pub struct PolicyChain {
    phases: Vec<PolicyPhase>,
}

impl PolicyChain {
    pub fn new(phases: Vec<PolicyPhase>) -> Self {
        Self { phases }
    }

    /// Single-class eligibility checks first, then the multi-class keys
    pub fn default_phases() -> Vec<Vec<PolicyKind>> {
        vec![
            vec![
                PolicyKind::NoKeepRules,
                PolicyKind::NoInterfaces,
                PolicyKind::NoEnums,
                PolicyKind::NoAnnotations,
            ],
            vec![
                PolicyKind::SameParentClass,
                PolicyKind::SamePackage,
                PolicyKind::SameInterfaces,
                PolicyKind::AllInstantiatedOrUninstantiated,
                PolicyKind::SameAccessKind,
            ],
        ]
    }

    pub fn from_kinds(phases: &[Vec<PolicyKind>], keep: Vec<String>) -> Self {
        Self::new(
            phases
                .iter()
                .map(|kinds| PolicyPhase::new(kinds.iter().map(|kind| kind.build(&keep)).collect()))
                .collect(),
        )
    }

    pub fn phases(&self) -> &[PolicyPhase] {
        &self.phases
    }
}

impl Default for PolicyChain {
    fn default() -> Self {
        Self::from_kinds(&Self::default_phases(), Vec::new())
    }
}

/// Refined groups plus the classes each policy excluded
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyChainResult {
    /// Final partition, singletons included
    pub groups: Vec<MergeGroup>,
    pub ineligible: Vec<Ineligibility>,
}

impl PolicyChainResult {
    /// Groups that actually merge something
    pub fn mergeable_groups(&self) -> impl Iterator<Item = &MergeGroup> {
        self.groups.iter().filter(|g| g.len() > 1)
    }
}

enum Evaluation {
    Keys(Vec<MergeKey>),
    Ineligible(&'static str),
}

/// Run every phase over `groups`.
///
/// Classes are never moved between groups, only split apart or removed, so the result refines
/// the input partition.
pub fn apply_policy_chain(groups: Vec<MergeGroup>, chain: &PolicyChain, ctx: &PolicyContext<'_>) -> PolicyChainResult {
    let mut groups: Vec<MergeGroup> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    let mut ineligible = Vec::new();

    for phase in chain.phases() {
        groups = apply_phase(groups, phase, ctx, &mut ineligible);
        debug!(
            "After phase [{}]: {} groups, {} ineligible",
            phase.names().join(", "),
            groups.len(),
            ineligible.len()
        );
    }

    PolicyChainResult { groups, ineligible }
}

fn apply_phase(
    groups: Vec<MergeGroup>,
    phase: &PolicyPhase,
    ctx: &PolicyContext<'_>,
    ineligible: &mut Vec<Ineligibility>,
) -> Vec<MergeGroup> {
    let mut refined = Vec::new();

    for group in groups {
        // Keys are computed in parallel, partitioning stays sequential to keep first-seen order
        let evaluations: Vec<Evaluation> = group
            .classes()
            .par_iter()
            .map(|class_type| evaluate(class_type, phase, ctx))
            .collect();

        let mut slot_of_keys: HashMap<Vec<MergeKey>, usize> = HashMap::new();
        let mut partition: Vec<Vec<ClassType>> = Vec::new();

        for (class_type, evaluation) in group.into_classes().into_iter().zip(evaluations) {
            match evaluation {
                Evaluation::Keys(keys) => {
                    let slot = *slot_of_keys.entry(keys).or_insert_with(|| {
                        partition.push(Vec::new());
                        partition.len() - 1
                    });
                    partition[slot].push(class_type);
                }
                Evaluation::Ineligible(policy) => {
                    debug!("{} is ineligible: {}", class_type, policy);
                    ineligible.push(Ineligibility {
                        class: class_type,
                        policy,
                    });
                }
            }
        }

        refined.extend(partition.into_iter().map(MergeGroup::new));
    }

    refined
}

fn evaluate(class_type: &ClassType, phase: &PolicyPhase, ctx: &PolicyContext<'_>) -> Evaluation {
    let Some(class) = ctx.program.definition_for(class_type) else {
        return Evaluation::Ineligible("missing-definition");
    };

    let mut keys = Vec::with_capacity(phase.policies().len());
    for policy in phase.policies() {
        match policy.merge_key(class, ctx) {
            KeyResult::Key(key) => keys.push(key),
            KeyResult::Ineligible => return Evaluation::Ineligible(policy.name()),
        }
    }
    Evaluation::Keys(keys)
}
