//! Rules for fields referencing other entities.

use staging_schema::{EntityKind, FieldDescriptor, FieldType};

use super::{
    FieldRule, RuleContext, RuleOutcome, PRIORITY_HIERARCHY, PRIORITY_REFERENCE,
    PRIORITY_REFERENCE_REVISIONS,
};
use crate::step::{
    unit_id, LanguageVariant, MigrationRef, Pipeline, Process, TransformStep, LANGCODE_SOURCE,
};

/// Default-language unit ids a reference field may point at.
///
/// `None` when the target type is unknown or not staged, or when no target
/// bundle resolves. An empty allow-list counts as absent.
pub(crate) fn target_units(
    ctx: &RuleContext<'_>,
    field: &FieldDescriptor,
    require_allow_list: bool,
) -> Option<MigrationRef> {
    let target_type = field.target_type()?;
    if !ctx.scope.in_scope(target_type) {
        return None;
    }
    let target = ctx.scope.schema.entity_type(target_type)?;

    let bundles: Vec<String> = if !target.has_bundle() {
        vec![target.id.clone()]
    } else {
        // An empty allow-list means "no restriction".
        match field.target_bundles().filter(|allowed| !allowed.is_empty()) {
            Some(allowed) => allowed.to_vec(),
            None if require_allow_list => return None,
            None => ctx
                .scope
                .enabled_bundles(target_type)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    };

    MigrationRef::from_targets(
        bundles
            .iter()
            .map(|bundle| unit_id(target_type, bundle, LanguageVariant::DefaultLanguage))
            .collect(),
    )
}

pub(crate) fn language_of(field: &FieldDescriptor) -> Option<String> {
    field.translatable.then(|| LANGCODE_SOURCE.to_string())
}

/// A parent relation pointing back at the same entity type resolves within
/// the bundle being planned.
pub struct HierarchyRule;

impl FieldRule for HierarchyRule {
    fn name(&self) -> &'static str {
        "hierarchy"
    }

    fn priority(&self) -> i32 {
        PRIORITY_HIERARCHY
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if field.field_type != FieldType::EntityReference
            || !field.is_hierarchy()
            || field.target_type() != Some(ctx.entity_type.id.as_str())
        {
            return RuleOutcome::decline();
        }
        let target = unit_id(
            &ctx.entity_type.id,
            ctx.bundle,
            LanguageVariant::DefaultLanguage,
        );
        RuleOutcome::halt_with(Pipeline::single(
            field.name.as_str(),
            TransformStep::ReferenceLookup {
                migration: MigrationRef::One(target),
                source: field.name.clone(),
                language: language_of(field),
                no_stub: false,
            },
        ))
    }
}

/// Plain entity reference into another staged entity type.
pub struct EntityReferenceRule;

impl FieldRule for EntityReferenceRule {
    fn name(&self) -> &'static str {
        "entity_reference"
    }

    fn priority(&self) -> i32 {
        PRIORITY_REFERENCE
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if field.field_type != FieldType::EntityReference {
            return RuleOutcome::decline();
        }
        let Some(migration) = target_units(ctx, field, false) else {
            return RuleOutcome::decline();
        };
        let no_stub = field
            .target_type()
            .and_then(|t| ctx.scope.schema.entity_type(t))
            .is_some_and(|t| t.kind == EntityKind::Account);

        RuleOutcome::halt_with(Pipeline::single(
            field.name.as_str(),
            TransformStep::ReferenceLookup {
                migration,
                source: field.name.clone(),
                language: language_of(field),
                no_stub,
            },
        ))
    }
}

/// Reference carrying its own revision: lookup yields `[id, revision_id]`
/// pairs which are fanned out into the two target properties.
pub struct ReferenceRevisionsRule;

impl FieldRule for ReferenceRevisionsRule {
    fn name(&self) -> &'static str {
        "entity_reference_revisions"
    }

    fn priority(&self) -> i32 {
        PRIORITY_REFERENCE_REVISIONS
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if field.field_type != FieldType::EntityReferenceRevisions {
            return RuleOutcome::decline();
        }
        let Some(migration) = target_units(ctx, field, true) else {
            return RuleOutcome::decline();
        };
        RuleOutcome::halt_with(Pipeline::single(
            field.name.as_str(),
            Process::Sequence(vec![
                TransformStep::RevisionReferenceLookup {
                    migration,
                    source: field.name.clone(),
                },
                TransformStep::revision_fan_out(),
            ]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{fixtures, RuleEngine};
    use staging_schema::{Schema, StagingConfig, StagingScope};

    fn ctx<'a>(
        schema: &'a Schema,
        config: &'a StagingConfig,
        entity_type: &str,
        bundle: &'a str,
    ) -> RuleContext<'a> {
        RuleContext {
            scope: StagingScope::new(schema, config),
            entity_type: schema.entity_type(entity_type).unwrap(),
            bundle,
            variant: LanguageVariant::DefaultLanguage,
        }
    }

    fn field<'a>(schema: &'a Schema, entity_type: &str, bundle: &str, name: &str) -> &'a FieldDescriptor {
        schema
            .entity_type(entity_type)
            .unwrap()
            .fields_for(bundle)
            .iter()
            .find(|f| f.name == name)
            .unwrap()
    }

    fn only_step(outcome: RuleOutcome, destination: &str) -> TransformStep {
        match outcome.fragment.unwrap().get(destination) {
            Some(Process::Single(step)) => step.clone(),
            other => panic!("expected single step, got {:?}", other),
        }
    }

    #[test]
    fn bundle_less_target_is_scalar_reference() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let outcome = EntityReferenceRule.resolve(&ctx, field(&schema, "node", "article", "uid"));
        assert!(outcome.halt);
        assert_eq!(
            only_step(outcome, "uid"),
            TransformStep::ReferenceLookup {
                migration: MigrationRef::One("user_user_default_language".into()),
                source: "uid".into(),
                language: None,
                no_stub: true,
            }
        );
    }

    #[test]
    fn missing_allow_list_enumerates_enabled_bundles() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let step = only_step(
            EntityReferenceRule.resolve(&ctx, field(&schema, "node", "article", "related")),
            "related",
        );
        assert_eq!(
            step.migration(),
            Some(&MigrationRef::Many(vec![
                "node_article_default_language".into(),
                "node_page_default_language".into(),
            ]))
        );
    }

    #[test]
    fn single_allowed_bundle_collapses_and_tracks_language() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let step = only_step(
            EntityReferenceRule.resolve(&ctx, field(&schema, "node", "article", "tags")),
            "tags",
        );
        assert_eq!(
            step,
            TransformStep::ReferenceLookup {
                migration: MigrationRef::One("taxonomy_term_tags_default_language".into()),
                source: "tags".into(),
                language: Some(LANGCODE_SOURCE.into()),
                no_stub: false,
            }
        );
    }

    #[test]
    fn empty_allow_list_enumerates_enabled_bundles() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let descriptor = FieldDescriptor::reference(
            "terms",
            FieldType::EntityReference,
            "taxonomy_term",
            Some(vec![]),
        );
        let fragment = RuleEngine::with_builtin_rules()
            .resolve(&ctx, &descriptor)
            .unwrap();
        assert_eq!(
            fragment.get("terms"),
            Some(&Process::Single(TransformStep::ReferenceLookup {
                migration: MigrationRef::Many(vec![
                    "taxonomy_term_tags_default_language".into(),
                    "taxonomy_term_topics_default_language".into(),
                ]),
                source: "terms".into(),
                language: None,
                no_stub: false,
            }))
        );
    }

    #[test]
    fn out_of_scope_target_declines() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let outcome = EntityReferenceRule.resolve(&ctx, field(&schema, "node", "article", "comments"));
        assert_eq!(outcome, RuleOutcome::decline());
    }

    #[test]
    fn no_enabled_target_bundle_declines() {
        let schema = fixtures::schema();
        let mut config = fixtures::config();
        config.entity_types.get_mut("node").unwrap().bundles.clear();
        let ctx = ctx(&schema, &config, "node", "article");
        let outcome = EntityReferenceRule.resolve(&ctx, field(&schema, "node", "article", "related"));
        assert_eq!(outcome, RuleOutcome::decline());
    }

    #[test]
    fn hierarchy_resolves_to_current_bundle() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "taxonomy_term", "tags");
        let step = only_step(
            HierarchyRule.resolve(&ctx, field(&schema, "taxonomy_term", "tags", "parent")),
            "parent",
        );
        assert_eq!(
            step.migration(),
            Some(&MigrationRef::One("taxonomy_term_tags_default_language".into()))
        );
    }

    #[test]
    fn hierarchy_ignores_plain_references() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let outcome = HierarchyRule.resolve(&ctx, field(&schema, "node", "article", "related"));
        assert_eq!(outcome, RuleOutcome::decline());
    }

    #[test]
    fn revisions_fan_out_after_lookup() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let outcome =
            ReferenceRevisionsRule.resolve(&ctx, field(&schema, "node", "article", "sections"));
        let pipeline = outcome.fragment.unwrap();
        let steps = pipeline.get("sections").unwrap().steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0],
            TransformStep::RevisionReferenceLookup {
                migration: MigrationRef::Many(vec![
                    "paragraph_text_default_language".into(),
                    "paragraph_gallery_default_language".into(),
                ]),
                source: "sections".into(),
            }
        );
        assert_eq!(steps[1], TransformStep::revision_fan_out());
    }

    #[test]
    fn revisions_without_allow_list_decline() {
        let schema = fixtures::schema();
        let config = fixtures::config();
        let ctx = ctx(&schema, &config, "node", "article");
        let descriptor = FieldDescriptor::reference(
            "sections",
            FieldType::EntityReferenceRevisions,
            "paragraph",
            None,
        );
        assert_eq!(
            ReferenceRevisionsRule.resolve(&ctx, &descriptor),
            RuleOutcome::decline()
        );

        let empty = FieldDescriptor::reference(
            "sections",
            FieldType::EntityReferenceRevisions,
            "paragraph",
            Some(vec![]),
        );
        assert_eq!(ReferenceRevisionsRule.resolve(&ctx, &empty), RuleOutcome::decline());
    }
}
