use crate::config::glob_match;
use crate::policy::{KeyResult, MergeKey, MergePolicy, PolicyContext};
use crate::program::ProgramClass;

/// Classes matched by a keep pattern must survive under their own name
pub struct NoKeepRulesPolicy {
    patterns: Vec<String>,
}

impl NoKeepRulesPolicy {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_kept(&self, class: &ProgramClass) -> bool {
        self.patterns
            .iter()
            .any(|pattern| glob_match(pattern, class.class_type.name()))
    }
}

impl MergePolicy for NoKeepRulesPolicy {
    fn name(&self) -> &'static str {
        "no-keep-rules"
    }

    fn merge_key(&self, class: &ProgramClass, _ctx: &PolicyContext<'_>) -> KeyResult {
        if self.is_kept(class) {
            KeyResult::Ineligible
        } else {
            KeyResult::Key(MergeKey::Bool(true))
        }
    }
}
