use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::ProgramClass;

/// Abstract and concrete classes never merge, nor do final and non-final ones
pub struct SameAccessKindPolicy;

impl MergePolicy for SameAccessKindPolicy {
    fn name(&self) -> &'static str {
        "same-access-kind"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        KeyResult::Key(MergeKey::Composite(vec![
            MergeKey::Bool(class.access.is_abstract),
            MergeKey::Bool(class.access.is_final),
        ]))
    }
}
