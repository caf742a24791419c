use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::ProgramClass;

/// Instantiated and never-instantiated classes are kept apart, so a merged class never gains
/// instances it could not have had
pub struct AllInstantiatedOrUninstantiatedPolicy;

impl MergePolicy for AllInstantiatedOrUninstantiatedPolicy {
    fn name(&self) -> &'static str {
        "all-instantiated-or-uninstantiated"
    }

    fn merge_key(&self, class: &ProgramClass, ctx: &PolicyContext<'_>) -> KeyResult {
        KeyResult::Key(MergeKey::Bool(
            ctx.instantiation
                .is_instantiated_directly_or_indirectly(&class.class_type),
        ))
    }
}
