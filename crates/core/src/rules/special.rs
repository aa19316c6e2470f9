//! Rules tied to a particular entity kind: navigation links and assets.

use staging_schema::{EntityKind, FieldDescriptor, FieldType};

use super::reference::language_of;
use super::{
    FieldRule, RuleContext, RuleOutcome, PRIORITY_ASSET_URI, PRIORITY_ATTACHMENT,
    PRIORITY_NAVIGATION_PARENT,
};
use crate::step::{
    unit_id, LanguageVariant, MigrationRef, Pipeline, TransformStep, ASSET_URI_FIELD,
    FILEPATH_SOURCE, MENU_NAME_SOURCE,
};

const NAVIGATION_PARENT_FIELD: &str = "parent";

/// A navigation link's parent is a type-prefixed identifier
/// (`menu_link_content:<uuid>`) resolved within the link's own menu.
pub struct NavigationParentRule;

impl FieldRule for NavigationParentRule {
    fn name(&self) -> &'static str {
        "navigation_parent"
    }

    fn priority(&self) -> i32 {
        PRIORITY_NAVIGATION_PARENT
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if ctx.entity_type.kind != EntityKind::NavigationLink
            || field.name != NAVIGATION_PARENT_FIELD
        {
            return RuleOutcome::decline();
        }
        RuleOutcome::halt_with(Pipeline::single(
            field.name.as_str(),
            TransformStep::MenuParentLookup {
                source: field.name.clone(),
                menu: MENU_NAME_SOURCE.to_string(),
                language: language_of(field),
            },
        ))
    }
}

/// The storage URI of an asset copies the binary from the staging tree.
pub struct AssetUriRule;

impl FieldRule for AssetUriRule {
    fn name(&self) -> &'static str {
        "asset_uri"
    }

    fn priority(&self) -> i32 {
        PRIORITY_ASSET_URI
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if ctx.entity_type.kind != EntityKind::Asset || field.name != ASSET_URI_FIELD {
            return RuleOutcome::decline();
        }
        RuleOutcome::halt_with(Pipeline::single(
            field.name.as_str(),
            TransformStep::FileCopy {
                source: vec![FILEPATH_SOURCE.to_string(), field.name.clone()],
            },
        ))
    }
}

/// Image and file attachments split into the asset reference plus the
/// `alt` / `title` companions the normalizer emits next to it.
pub struct AttachmentRule;

impl FieldRule for AttachmentRule {
    fn name(&self) -> &'static str {
        "attachment"
    }

    fn priority(&self) -> i32 {
        PRIORITY_ATTACHMENT
    }

    fn resolve(&self, ctx: &RuleContext<'_>, field: &FieldDescriptor) -> RuleOutcome {
        if field.field_type != FieldType::ImageOrFile {
            return RuleOutcome::decline();
        }
        let Some(asset) = ctx.scope.schema.asset_type() else {
            return RuleOutcome::decline();
        };
        if !ctx.scope.in_scope(&asset.id) {
            return RuleOutcome::decline();
        }
        let targets = ctx
            .scope
            .staged_bundles(asset)
            .into_iter()
            .map(|bundle| unit_id(&asset.id, bundle, LanguageVariant::DefaultLanguage))
            .collect();
        let Some(migration) = MigrationRef::from_targets(targets) else {
            return RuleOutcome::decline();
        };

        let name = &field.name;
        RuleOutcome::halt_with(
            Pipeline::new()
                .with(
                    format!("{}/target_id", name),
                    TransformStep::ReferenceLookup {
                        migration,
                        source: name.clone(),
                        language: language_of(field),
                        no_stub: false,
                    },
                )
                .with(
                    format!("{}/alt", name),
                    TransformStep::copy(format!("{}_alt", name)),
                )
                .with(
                    format!("{}/title", name),
                    TransformStep::copy(format!("{}_title", name)),
                ),
        )
    }
}
