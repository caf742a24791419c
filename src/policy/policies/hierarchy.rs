use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::{ClassType, ProgramClass};

/// Only classes with the same declared super type may merge; merging siblings keeps the
/// hierarchy above them intact
pub struct SameParentClassPolicy;

impl MergePolicy for SameParentClassPolicy {
    fn name(&self) -> &'static str {
        "same-parent-class"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        KeyResult::Key(MergeKey::Type(class.super_type.clone()))
    }
}

/// Only classes implementing exactly the same set of interfaces may merge
pub struct SameInterfacesPolicy;

impl MergePolicy for SameInterfacesPolicy {
    fn name(&self) -> &'static str {
        "same-interfaces"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        let mut interfaces: Vec<ClassType> = class.interfaces.clone();
        interfaces.sort();
        interfaces.dedup();
        KeyResult::Key(MergeKey::Types(interfaces))
    }
}
