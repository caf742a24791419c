// Built-in merge policies

mod access_kind;
mod class_kind;
mod hierarchy;
mod instantiated;
mod keep_rules;
mod package;

pub use access_kind::SameAccessKindPolicy;
pub use class_kind::{NoAnnotationsPolicy, NoEnumsPolicy, NoInterfacesPolicy};
pub use hierarchy::{SameInterfacesPolicy, SameParentClassPolicy};
pub use instantiated::AllInstantiatedOrUninstantiatedPolicy;
pub use keep_rules::NoKeepRulesPolicy;
pub use package::SamePackagePolicy;
