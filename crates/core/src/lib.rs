//! staging-core: the content staging plan compiler.
//!
//! Turns an exported snapshot tree plus the host schema into a plan of
//! migration units, one per (entity type, bundle, language variant).
//!
//! # Public API
//!
//! - [`RuleEngine`] -- ordered, short-circuiting field rule chain
//! - [`collect_dependencies()`] -- unit ids referenced by a pipeline
//! - [`Planner`] -- discard-then-rebuild plan compilation
//! - [`normalize_record()`] / [`read_snapshot_file()`] -- row normalizer
//! - [`Exporter`] -- writes the snapshot tree the planner reads
//!
//! Plan compilation is a single synchronous pass. Concurrent runs against
//! the same staging root or plan store must be serialized by the caller.

pub mod dependencies;
pub mod error;
pub mod export;
pub mod layout;
pub mod normalize;
pub mod planner;
pub mod rules;
pub mod step;

// ── Convenience re-exports ───────────────────────────────────────────

pub use dependencies::{collect_dependencies, StepVisitor};
pub use error::{ExportError, NormalizeError, PlanError};
pub use export::{
    group_translations, ContentEntity, ContentRepository, EntityVariant, ExportContext,
    ExportHook, ExportReport, ExportedFile, Exporter, JsonRepository, PathAlias, Snapshot,
};
pub use normalize::{
    classify, load_snapshot_records, normalize_record, read_snapshot_file, NormalizeOptions,
    RawFieldValue, Row,
};
pub use planner::{Compilation, FailedSnapshot, FieldFilter, MigrationUnit, PlanReport, Planner};
pub use rules::{FieldRule, RuleContext, RuleEngine, RuleOutcome};
pub use step::{unit_id, LanguageVariant, MigrationRef, Pipeline, Process, TransformStep};
