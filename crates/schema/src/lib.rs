//! staging-schema: typed descriptors of the host content schema.
//!
//! The planner and the exporter never talk to the host repository's
//! entity/field API directly. They consume a [`Schema`] snapshot (entity
//! types, their keys, bundles and per-bundle field descriptors) together
//! with an immutable [`StagingConfig`] naming which entity types and
//! bundles take part in staging.
//!
//! - [`from_schema_json()`] -- deserialize and validate a schema document
//! - [`StagingScope`] -- schema + config view answering "is this in scope?"

pub mod config;
pub mod deserialize;
pub mod types;

pub use config::{EntityTypeSettings, StagingConfig, StagingScope, StagingSettings};
pub use deserialize::{from_schema_json, load_schema, SchemaError};
pub use types::*;
