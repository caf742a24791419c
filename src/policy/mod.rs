//! Merge policies - strategies that decide which candidate classes may share a group
//!
//! A policy maps each class to a [`MergeKey`]; classes with different keys never end up in the
//! same group. A policy may also declare a class ineligible, removing it from grouping for the
//! rest of the chain.

mod chain;
mod policies;

pub use chain::{apply_policy_chain, Ineligibility, MergeGroup, PolicyChain, PolicyChainResult, PolicyPhase};
pub use policies::{
    AllInstantiatedOrUninstantiatedPolicy, NoAnnotationsPolicy, NoEnumsPolicy, NoInterfacesPolicy,
    NoKeepRulesPolicy, SameAccessKindPolicy, SameInterfacesPolicy, SamePackagePolicy, SameParentClassPolicy,
};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::oracle::InstantiationOracle;
use crate::program::{ClassType, Program, ProgramClass};

/// Grouping key produced by a policy. Two classes may share a group only if every policy
/// gives them equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MergeKey {
    Bool(bool),
    Type(Option<ClassType>),
    Types(Vec<ClassType>),
    Text(String),
    Composite(Vec<MergeKey>),
}

/// Outcome of evaluating one policy on one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult {
    Key(MergeKey),
    /// The class must not be merged at all
    Ineligible,
}

/// What policies may consult while computing keys
pub struct PolicyContext<'a> {
    pub program: &'a Program,
    pub instantiation: &'a (dyn InstantiationOracle + Sync),
}

impl<'a> PolicyContext<'a> {
    pub fn new(program: &'a Program, instantiation: &'a (dyn InstantiationOracle + Sync)) -> Self {
        Self { program, instantiation }
    }
}

/// A single grouping strategy.
///
/// `merge_key` must be pure: the chain evaluates it on many classes at once.
pub trait MergePolicy: Send + Sync {
    /// Name used when recording ineligible classes
    fn name(&self) -> &'static str;

    fn merge_key(&self, class: &ProgramClass, ctx: &PolicyContext<'_>) -> KeyResult;
}

/// The closed set of policies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    SameParentClass,
    AllInstantiatedOrUninstantiated,
    SamePackage,
    SameInterfaces,
    NoInterfaces,
    NoEnums,
    NoAnnotations,
    NoKeepRules,
    SameAccessKind,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::SameParentClass => "same-parent-class",
            PolicyKind::AllInstantiatedOrUninstantiated => "all-instantiated-or-uninstantiated",
            PolicyKind::SamePackage => "same-package",
            PolicyKind::SameInterfaces => "same-interfaces",
            PolicyKind::NoInterfaces => "no-interfaces",
            PolicyKind::NoEnums => "no-enums",
            PolicyKind::NoAnnotations => "no-annotations",
            PolicyKind::NoKeepRules => "no-keep-rules",
            PolicyKind::SameAccessKind => "same-access-kind",
        }
    }

    /// Instantiate the policy; `keep` feeds the keep-rule policy
    pub fn build(&self, keep: &[String]) -> Box<dyn MergePolicy> {
        match self {
            PolicyKind::SameParentClass => Box::new(SameParentClassPolicy),
            PolicyKind::AllInstantiatedOrUninstantiated => Box::new(AllInstantiatedOrUninstantiatedPolicy),
            PolicyKind::SamePackage => Box::new(SamePackagePolicy),
            PolicyKind::SameInterfaces => Box::new(SameInterfacesPolicy),
            PolicyKind::NoInterfaces => Box::new(NoInterfacesPolicy),
            PolicyKind::NoEnums => Box::new(NoEnumsPolicy),
            PolicyKind::NoAnnotations => Box::new(NoAnnotationsPolicy),
            PolicyKind::NoKeepRules => Box::new(NoKeepRulesPolicy::new(keep.to_vec())),
            PolicyKind::SameAccessKind => Box::new(SameAccessKindPolicy),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
