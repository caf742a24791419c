// Access oracles - the narrow interfaces through which the analysis sees the class hierarchy

mod app_info;

pub use app_info::AppInfo;

use crate::program::{AccessFlags, ClassType, ElementId, FieldRef, InvokeKind, MethodRef, ProgramClass};

/// The member a reference resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
    /// Field or method element on its defining class
    pub element: ElementId,
    /// Class that defines the member
    pub holder: ClassType,
    /// Access flags of the definition
    pub access: AccessFlags,
}

/// Why a reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    /// The referenced holder is not defined (incomplete classpath)
    MissingHolder,
    /// No member with the referenced name and signature exists
    NoSuchMember,
    /// Several maximally specific interface methods match
    Ambiguous,
    /// Class reference used with interface dispatch, or the other way around
    IncompatibleHolder,
}

/// Result of resolving a field or method reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved {
        /// The class named by the reference, where resolution started
        initial_holder: ClassType,
        member: ResolvedMember,
    },
    Failed(ResolutionFailure),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    pub fn member(&self) -> Option<&ResolvedMember> {
        match self {
            Resolution::Resolved { member, .. } => Some(member),
            Resolution::Failed(_) => None,
        }
    }
}

/// Resolves references with the semantics of the runtime dispatch they represent
pub trait ResolutionOracle {
    fn definition_for(&self, class_type: &ClassType) -> Option<&ProgramClass>;

    fn resolve_field(&self, field: &FieldRef) -> Resolution;

    fn resolve_method(&self, method: &MethodRef, kind: InvokeKind) -> Resolution;
}

pub trait SubtypeOracle {
    /// Reflexive: every class is a subtype of itself
    fn is_subtype(&self, sub: &ClassType, sup: &ClassType) -> bool;
}

pub trait ProtectedAccessOracle {
    /// Whether code in `context` may access a protected member declared on `member_holder`
    fn is_valid_protected_access(&self, member_holder: &ClassType, context: &ClassType) -> bool;
}

pub trait InstantiationOracle {
    fn is_instantiated_directly_or_indirectly(&self, class_type: &ClassType) -> bool;
}

/// Everything the use registry consults while scanning
pub trait AccessOracles: ResolutionOracle + SubtypeOracle + ProtectedAccessOracle + Sync {}

impl<T> AccessOracles for T where T: ResolutionOracle + SubtypeOracle + ProtectedAccessOracle + Sync {}
