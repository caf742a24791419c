use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::ProgramClass;

/// Merging must not move code across packages
pub struct SamePackagePolicy;

impl MergePolicy for SamePackagePolicy {
    fn name(&self) -> &'static str {
        "same-package"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        KeyResult::Key(MergeKey::Text(class.class_type.package().to_string()))
    }
}
