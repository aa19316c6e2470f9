//! Translation exporter.
//!
//! Walks every staged entity of the content repository, splits its language
//! variants into `default_language` and `translations` groups, runs the
//! pre-export hooks and writes one snapshot file per
//! (entity type, language group, bundle).

mod hooks;
mod repository;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use staging_schema::{EntityTypeDescriptor, StagingScope};

use crate::error::ExportError;
use crate::layout::snapshot_path;
use crate::step::LanguageVariant;

pub use hooks::{AssetCopier, HierarchyParentAttacher, ReservedAccountFilter, RESERVED_ACCOUNT_IDS};
pub use repository::JsonRepository;

/// Field holding the canonical URL alias in a snapshot.
pub const PATH_FIELD: &str = "path";

/// One language variant of a content entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityVariant {
    pub langcode: String,
    /// Raw exported field value trees.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// A content entity with all of its language variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub entity_type: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    pub default_langcode: String,
    pub variants: Vec<EntityVariant>,
}

/// A stored URL alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathAlias {
    pub pid: u64,
    pub alias: String,
}

/// One exported item: a single language variant of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub entity_id: String,
    pub langcode: String,
    pub fields: Map<String, Value>,
}

/// Source of the content being exported.
pub trait ContentRepository {
    /// Entities of a type, restricted to one bundle when given.
    fn load_entities(
        &self,
        entity_type: &EntityTypeDescriptor,
        bundle: Option<&str>,
    ) -> Result<Vec<ContentEntity>, ExportError>;

    /// Alias stored for an internal path in a language.
    fn path_alias(&self, path: &str, langcode: &str) -> Option<PathAlias>;

    /// Parent references of a hierarchical entity, as field value entries.
    fn parents(&self, _entity_type: &str, _entity_id: &str) -> Vec<Value> {
        Vec::new()
    }

    /// Where the binary behind an asset URI can be read from.
    fn asset_location(&self, uri: &str) -> Option<PathBuf>;
}

/// What a pre-export hook sees besides the snapshots themselves.
pub struct ExportContext<'a> {
    pub scope: StagingScope<'a>,
    pub entity_type: &'a EntityTypeDescriptor,
    /// `None` for entity types without bundles.
    pub bundle: Option<&'a str>,
    pub variant: LanguageVariant,
    pub staging_root: &'a Path,
    pub repository: &'a dyn ContentRepository,
}

/// Mutates or filters a language group right before it is written.
pub trait ExportHook {
    fn name(&self) -> &'static str;

    fn before_export(
        &self,
        ctx: &ExportContext<'_>,
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), ExportError>;
}

/// Split entities into their language groups.
///
/// Each variant matching its entity's default language goes to
/// `DefaultLanguage`, every other variant to `Translations`. Variants pick
/// up their canonical alias when the entity type has a canonical path.
pub fn group_translations(
    entity_type: &EntityTypeDescriptor,
    entities: Vec<ContentEntity>,
    repository: &dyn ContentRepository,
) -> BTreeMap<LanguageVariant, Vec<Snapshot>> {
    let mut groups: BTreeMap<LanguageVariant, Vec<Snapshot>> = BTreeMap::new();
    for entity in entities {
        let canonical = entity_type.canonical_path_for(&entity.id);
        for variant in entity.variants {
            let mut fields = variant.fields;
            if let Some(path) = &canonical {
                let alias = repository
                    .path_alias(path, &variant.langcode)
                    .map(|a| {
                        json!([{ "pid": a.pid, "alias": a.alias, "langcode": variant.langcode }])
                    })
                    .unwrap_or_else(|| json!([]));
                fields.insert(PATH_FIELD.to_string(), alias);
            }
            let group = if variant.langcode == entity.default_langcode {
                LanguageVariant::DefaultLanguage
            } else {
                LanguageVariant::Translations
            };
            groups.entry(group).or_default().push(Snapshot {
                entity_id: entity.id.clone(),
                langcode: variant.langcode,
                fields,
            });
        }
    }
    groups
}

/// A snapshot file written by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub entity_type: String,
    pub bundle: String,
    pub language: LanguageVariant,
    pub path: PathBuf,
    pub items: usize,
}

/// Outcome of one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    pub fn items(&self) -> usize {
        self.files.iter().map(|f| f.items).sum()
    }
}

/// Writes the snapshot tree the planner reads.
pub struct Exporter<'a> {
    scope: StagingScope<'a>,
    repository: &'a dyn ContentRepository,
    staging_root: PathBuf,
    hooks: Vec<Box<dyn ExportHook + 'a>>,
}

impl<'a> Exporter<'a> {
    /// Exporter with the built-in hooks registered.
    pub fn new(
        scope: StagingScope<'a>,
        repository: &'a dyn ContentRepository,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        let mut exporter = Self::without_hooks(scope, repository, staging_root);
        exporter.add_hook(Box::new(ReservedAccountFilter));
        exporter.add_hook(Box::new(HierarchyParentAttacher));
        exporter.add_hook(Box::new(AssetCopier));
        exporter
    }

    pub fn without_hooks(
        scope: StagingScope<'a>,
        repository: &'a dyn ContentRepository,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Exporter {
            scope,
            repository,
            staging_root: staging_root.into(),
            hooks: Vec::new(),
        }
    }

    /// Hooks run in registration order.
    pub fn add_hook(&mut self, hook: Box<dyn ExportHook + 'a>) {
        self.hooks.push(hook);
    }

    /// Export every staged entity type, optionally restricted to one bundle.
    ///
    /// A bundle-less type is only exported under a bundle filter equal to
    /// its own id.
    pub fn export_all(&self, bundle_filter: Option<&str>) -> Result<ExportReport, ExportError> {
        let mut report = ExportReport::default();
        for entity_type in self.scope.types() {
            if entity_type.has_bundle() {
                for bundle in self.scope.enabled_bundles(&entity_type.id) {
                    if bundle_filter.is_some_and(|f| f != bundle) {
                        continue;
                    }
                    self.export_bundle(entity_type, Some(bundle), &mut report)?;
                }
            } else {
                if bundle_filter.is_some_and(|f| f != entity_type.id) {
                    continue;
                }
                self.export_bundle(entity_type, None, &mut report)?;
            }
        }
        Ok(report)
    }

    fn export_bundle(
        &self,
        entity_type: &'a EntityTypeDescriptor,
        bundle: Option<&'a str>,
        report: &mut ExportReport,
    ) -> Result<(), ExportError> {
        let entities = self.repository.load_entities(entity_type, bundle)?;
        let mut groups = group_translations(entity_type, entities, self.repository);
        let file_bundle = bundle.unwrap_or(&entity_type.id);

        for variant in LanguageVariant::ALL {
            let Some(mut snapshots) = groups.remove(&variant) else {
                continue;
            };
            let ctx = ExportContext {
                scope: self.scope,
                entity_type,
                bundle,
                variant,
                staging_root: &self.staging_root,
                repository: self.repository,
            };
            for hook in &self.hooks {
                hook.before_export(&ctx, &mut snapshots)?;
            }

            let path = snapshot_path(&self.staging_root, &entity_type.id, variant, file_bundle);
            write_snapshots(&path, &snapshots)?;
            tracing::info!(
                entity_type = %entity_type.id,
                language = %variant,
                bundle = file_bundle,
                items = snapshots.len(),
                "exported snapshot file"
            );
            report.files.push(ExportedFile {
                entity_type: entity_type.id.clone(),
                bundle: file_bundle.to_string(),
                language: variant,
                path,
                items: snapshots.len(),
            });
        }
        Ok(())
    }
}

fn write_snapshots(path: &Path, snapshots: &[Snapshot]) -> Result<(), ExportError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let items: Vec<&Map<String, Value>> = snapshots.iter().map(|s| &s.fields).collect();
    let encoded = serde_json::to_string_pretty(&items).map_err(|source| ExportError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, encoded).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
