//! Migration unit planner.
//!
//! For every staged (entity type, bundle, language variant) whose snapshot
//! file exists, dispatch each field through the rule engine, merge the
//! fragments into one pipeline and derive the unit's dependencies.
//! [`Planner::compile_plan`] discards the namespace in the store and saves
//! the fresh units: a full rebuild every time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use staging_schema::{EntityTypeDescriptor, StagingScope, StagingSettings};
use staging_store::{DestinationRecord, PlanRecord, PlanStore, SourceRecord};

use crate::dependencies::collect_dependencies;
use crate::error::PlanError;
use crate::layout::snapshot_path;
use crate::normalize::load_snapshot_records;
use crate::rules::{RuleContext, RuleEngine};
use crate::step::{unit_id, LanguageVariant, Pipeline, TransformStep, UUID_SOURCE};

/// Reader plugin the execution runtime uses for snapshot files.
pub const SOURCE_PLUGIN: &str = "staging_json";

/// Pre-compilation hook removing fields from consideration.
pub trait FieldFilter {
    /// Field names to skip for this (entity type, bundle).
    fn excluded_fields(&self, entity_type: &EntityTypeDescriptor, bundle: &str) -> Vec<String>;
}

/// One compiled unit, before it is turned into a plan record.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationUnit {
    pub id: String,
    pub entity_type: String,
    /// `None` for entity types without bundles.
    pub bundle: Option<String>,
    pub language: LanguageVariant,
    pub pipeline: Pipeline,
    /// Never contains `id`.
    pub dependencies: BTreeSet<String>,
}

impl MigrationUnit {
    fn staged_bundle(&self) -> &str {
        self.bundle.as_deref().unwrap_or(&self.entity_type)
    }

    /// The record handed to the plan-execution runtime. `input_path` is the
    /// snapshot under `staging_root`, the tree the unit was compiled from.
    pub fn to_record(
        &self,
        entity_type: &EntityTypeDescriptor,
        settings: &StagingSettings,
        staging_root: &Path,
    ) -> Result<PlanRecord, PlanError> {
        let process = serde_json::to_value(&self.pipeline).map_err(|source| PlanError::Encode {
            unit_id: self.id.clone(),
            source,
        })?;
        let bundle = self.staged_bundle();
        let input_path = snapshot_path(staging_root, &self.entity_type, self.language, bundle);
        let plugin = if entity_type.is_composite() {
            format!("entity_reference_revisions:{}", self.entity_type)
        } else {
            format!("entity:{}", self.entity_type)
        };

        Ok(PlanRecord {
            id: self.id.clone(),
            label: format!(
                "Import {} {} {}",
                entity_type.label,
                entity_type.bundle_label(bundle),
                self.language
            ),
            group: settings.namespace.clone(),
            tags: vec![settings.namespace.clone()],
            source: SourceRecord {
                plugin: SOURCE_PLUGIN.to_string(),
                input_path: input_path.to_string_lossy().into_owned(),
                ids: BTreeMap::from([(UUID_SOURCE.to_string(), "string".to_string())]),
            },
            process,
            destination: DestinationRecord {
                plugin,
                translations: self.language == LanguageVariant::Translations,
            },
            dependencies: self.dependencies.iter().cloned().collect(),
        })
    }
}

/// A snapshot that was present but could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedSnapshot {
    pub unit_id: String,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one plan compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Records removed from the namespace before the rebuild.
    pub discarded: usize,
    /// Compiled unit ids, in compilation order.
    pub units: Vec<String>,
    /// Candidate unit ids skipped because their snapshot file is absent.
    pub missing: Vec<String>,
    /// Candidates skipped because their snapshot file is malformed.
    pub failed: Vec<FailedSnapshot>,
}

/// Units plus the report of the pass that produced them.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    pub units: Vec<MigrationUnit>,
    pub report: PlanReport,
}

/// Compiles migration units from the schema, the staging configuration and
/// the snapshot tree.
pub struct Planner<'a> {
    scope: StagingScope<'a>,
    engine: RuleEngine,
    filters: Vec<Box<dyn FieldFilter + 'a>>,
    staging_root: PathBuf,
    verify_snapshots: bool,
}

impl<'a> Planner<'a> {
    /// Planner with the built-in rules, reading snapshots under `staging_root`.
    pub fn new(scope: StagingScope<'a>, staging_root: impl Into<PathBuf>) -> Self {
        Planner {
            scope,
            engine: RuleEngine::with_builtin_rules(),
            filters: Vec::new(),
            staging_root: staging_root.into(),
            verify_snapshots: scope.config.staging.verify_snapshots,
        }
    }

    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn verify_snapshots(mut self, verify: bool) -> Self {
        self.verify_snapshots = verify;
        self
    }

    pub fn add_filter(&mut self, filter: Box<dyn FieldFilter + 'a>) {
        self.filters.push(filter);
    }

    pub fn engine_mut(&mut self) -> &mut RuleEngine {
        &mut self.engine
    }

    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    fn excluded_fields(&self, entity_type: &EntityTypeDescriptor, bundle: &str) -> BTreeSet<String> {
        let mut excluded: BTreeSet<String> = self
            .scope
            .config
            .excluded_fields(&entity_type.id)
            .iter()
            .cloned()
            .collect();
        for filter in &self.filters {
            excluded.extend(filter.excluded_fields(entity_type, bundle));
        }
        excluded
    }

    /// Build one unit regardless of whether its snapshot exists.
    pub fn build_unit(
        &self,
        entity_type: &EntityTypeDescriptor,
        bundle: &str,
        variant: LanguageVariant,
    ) -> MigrationUnit {
        let id = unit_id(&entity_type.id, bundle, variant);
        let ctx = RuleContext {
            scope: self.scope,
            entity_type,
            bundle,
            variant,
        };
        let excluded = self.excluded_fields(entity_type, bundle);

        let mut pipeline = Pipeline::new();
        for field in entity_type.fields_for(bundle) {
            if excluded.contains(&field.name) {
                tracing::debug!(unit = %id, field = %field.name, "field excluded");
                continue;
            }
            let Some(fragment) = self.engine.resolve(&ctx, field) else {
                continue;
            };
            for (destination, process) in fragment {
                if !pipeline.insert(destination.as_str(), process) {
                    tracing::warn!(
                        unit = %id,
                        field = %field.name,
                        destination = %destination,
                        "destination already mapped, keeping the first mapping"
                    );
                }
            }
        }

        for property in &entity_type.synthetic_properties {
            pipeline.set(property.as_str(), TransformStep::copy(property.as_str()));
        }

        let mut dependencies = collect_dependencies(&pipeline);
        dependencies.remove(&id);

        MigrationUnit {
            id,
            entity_type: entity_type.id.clone(),
            bundle: entity_type.has_bundle().then(|| bundle.to_string()),
            language: variant,
            pipeline,
            dependencies,
        }
    }

    /// Every (entity type, bundle, variant) the configuration stages.
    pub fn candidates(&self) -> Vec<(&'a EntityTypeDescriptor, &'a str, LanguageVariant)> {
        let mut out = Vec::new();
        for entity_type in self.scope.types() {
            for bundle in self.scope.staged_bundles(entity_type) {
                out.push((entity_type, bundle, LanguageVariant::DefaultLanguage));
                if entity_type.translatable {
                    out.push((entity_type, bundle, LanguageVariant::Translations));
                }
            }
        }
        out
    }

    /// Compile every candidate whose snapshot file exists.
    pub fn compile(&self) -> Compilation {
        let mut compilation = Compilation::default();
        for (entity_type, bundle, variant) in self.candidates() {
            let path = snapshot_path(&self.staging_root, &entity_type.id, variant, bundle);
            let id = unit_id(&entity_type.id, bundle, variant);
            if !path.is_file() {
                tracing::debug!(unit = %id, path = %path.display(), "no snapshot, skipping unit");
                compilation.report.missing.push(id);
                continue;
            }
            if self.verify_snapshots {
                if let Err(err) = load_snapshot_records(&path) {
                    tracing::warn!(unit = %id, error = %err, "skipping unit with unreadable snapshot");
                    compilation.report.failed.push(FailedSnapshot {
                        unit_id: id,
                        path,
                        error: err.to_string(),
                    });
                    continue;
                }
            }

            let unit = self.build_unit(entity_type, bundle, variant);
            tracing::info!(
                entity_type = %entity_type.id,
                language = %variant,
                bundle,
                "migration unit compiled"
            );
            compilation.report.units.push(unit.id.clone());
            compilation.units.push(unit);
        }
        compilation
    }

    /// Discard the namespace in `store`, then compile and save every unit.
    pub fn compile_plan(&self, store: &mut dyn PlanStore) -> Result<PlanReport, PlanError> {
        let settings = &self.scope.config.staging;
        let discarded = store.discard_namespace(&settings.namespace)?;
        tracing::debug!(namespace = %settings.namespace, discarded, "discarded previous plan");

        let Compilation { units, mut report } = self.compile();
        for unit in &units {
            let Some(entity_type) = self.scope.schema.entity_type(&unit.entity_type) else {
                continue;
            };
            store.save(&unit.to_record(entity_type, settings, &self.staging_root)?)?;
        }
        report.discarded = discarded;
        Ok(report)
    }
}
