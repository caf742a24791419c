use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::ProgramClass;

/// Interfaces are never merged
pub struct NoInterfacesPolicy;

impl MergePolicy for NoInterfacesPolicy {
    fn name(&self) -> &'static str {
        "no-interfaces"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        if class.access.is_interface {
            KeyResult::Ineligible
        } else {
            KeyResult::Key(MergeKey::Bool(true))
        }
    }
}

/// Enums are never merged: their values and ordinals are observable
pub struct NoEnumsPolicy;

impl MergePolicy for NoEnumsPolicy {
    fn name(&self) -> &'static str {
        "no-enums"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        if class.access.is_enum {
            KeyResult::Ineligible
        } else {
            KeyResult::Key(MergeKey::Bool(true))
        }
    }
}

pub struct NoAnnotationsPolicy;

impl MergePolicy for NoAnnotationsPolicy {
    fn name(&self) -> &'static str {
        "no-annotations"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        if class.access.is_annotation {
            KeyResult::Ineligible
        } else {
            KeyResult::Key(MergeKey::Bool(true))
        }
    }
}
