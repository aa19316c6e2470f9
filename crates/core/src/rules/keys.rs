//! Rules for entity key fields (revision, uuid, primary id).

use staging_schema::FieldDescriptor;

use super::{FieldRule, RuleContext, RuleOutcome, PRIORITY_IDENTITY, PRIORITY_REVISION, PRIORITY_UUID};
use crate::step::{unit_id, LanguageVariant, MigrationRef, Pipeline, TransformStep, UUID_SOURCE};

/// The revision key is minted by the target, except for composite entities
/// whose host references them by revision.
pub struct RevisionKeyRule;

impl FieldRule for RevisionKeyRule {
    fn name(&self) -> &'static str {
        "revision_key"
    }

    fn priority(&self) -> i32 {
        PRIORITY_REVISION
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if !ctx.entity_type.is_revision_key(&field.name) {
            return RuleOutcome::decline();
        }
        if ctx.entity_type.is_composite() {
            RuleOutcome::halt_with(Pipeline::single(
                field.name.as_str(),
                TransformStep::copy(field.name.as_str()),
            ))
        } else {
            RuleOutcome::halt_empty()
        }
    }
}

/// The uuid key is only carried over for types that keep source UUIDs.
pub struct UuidKeyRule;

impl FieldRule for UuidKeyRule {
    fn name(&self) -> &'static str {
        "uuid_key"
    }

    fn priority(&self) -> i32 {
        PRIORITY_UUID
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if !ctx.entity_type.is_uuid_key(&field.name) {
            return RuleOutcome::decline();
        }
        if ctx.entity_type.preserve_uuid {
            RuleOutcome::halt_with(Pipeline::single(
                field.name.as_str(),
                TransformStep::copy(field.name.as_str()),
            ))
        } else {
            RuleOutcome::halt_empty()
        }
    }
}

/// The primary id is minted by the target for default-language rows.
/// Translation rows look it up from the default-language unit of the same
/// bundle so they attach to the right entity.
pub struct IdentityKeyRule;

impl FieldRule for IdentityKeyRule {
    fn name(&self) -> &'static str {
        "identity_key"
    }

    fn priority(&self) -> i32 {
        PRIORITY_IDENTITY
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if !ctx.entity_type.is_id_key(&field.name) {
            return RuleOutcome::decline();
        }
        match ctx.variant {
            LanguageVariant::DefaultLanguage => RuleOutcome::halt_empty(),
            LanguageVariant::Translations => {
                let target = unit_id(
                    &ctx.entity_type.id,
                    ctx.bundle,
                    LanguageVariant::DefaultLanguage,
                );
                RuleOutcome::halt_with(Pipeline::single(
                    field.name.as_str(),
                    TransformStep::lookup(MigrationRef::One(target), UUID_SOURCE),
                ))
            }
        }
    }
}
