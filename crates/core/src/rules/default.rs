use staging_schema::FieldDescriptor;

use super::{FieldRule, RuleContext, RuleOutcome, PRIORITY_DEFAULT};
use crate::step::{Pipeline, TransformStep};

/// Terminal rule: copy the field, in the row's language when translatable.
pub struct DefaultRule;

impl FieldRule for DefaultRule {
    fn name(&self) -> &'static str {
        "default"
    }

    fn priority(&self) -> i32 {
        PRIORITY_DEFAULT
    }

    fn resolve(&self, _ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        let step = if field.translatable {
            TransformStep::localized_get(field.name.as_str())
        } else {
            TransformStep::copy(field.name.as_str())
        };
        RuleOutcome::halt_with(Pipeline::single(field.name.as_str(), step))
    }
}
