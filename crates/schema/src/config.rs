//! Staging configuration: which entity types and bundles take part.
//!
//! The configuration is an immutable value handed to the planner and the
//! exporter at call time. It is usually read from a TOML file:
//!
//! ```toml
//! [staging]
//! directory = "../staging"
//! namespace = "content_staging"
//!
//! [entity_types.node]
//! enable = true
//! excluded_fields = ["vid"]
//!
//! [entity_types.node.bundles]
//! article = true
//! page = false
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{EntityTypeDescriptor, Schema};

/// Top-level staging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    #[serde(default)]
    pub staging: StagingSettings,
    /// Per entity type settings, keyed by entity type id.
    #[serde(default)]
    pub entity_types: BTreeMap<String, EntityTypeSettings>,
}

/// `[staging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingSettings {
    /// Root of the snapshot tree.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Plan namespace; every unit in it is discarded before a rebuild.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Parse every snapshot file before emitting its unit; a malformed file
    /// skips only that unit. On unless turned off.
    #[serde(default = "default_verify_snapshots")]
    pub verify_snapshots: bool,
}

impl Default for StagingSettings {
    fn default() -> Self {
        StagingSettings {
            directory: default_directory(),
            namespace: default_namespace(),
            verify_snapshots: default_verify_snapshots(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("../staging")
}

fn default_namespace() -> String {
    "content_staging".to_string()
}

fn default_verify_snapshots() -> bool {
    true
}

/// `[entity_types.<id>]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeSettings {
    #[serde(default)]
    pub enable: bool,
    /// Bundle id -> staging enabled.
    #[serde(default)]
    pub bundles: BTreeMap<String, bool>,
    /// Fields removed from consideration before rule dispatch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_fields: Vec<String>,
}

impl StagingConfig {
    pub fn entity_type_enabled(&self, entity_type: &str) -> bool {
        self.entity_types
            .get(entity_type)
            .is_some_and(|s| s.enable)
    }

    pub fn bundle_enabled(&self, entity_type: &str, bundle: &str) -> bool {
        self.entity_types
            .get(entity_type)
            .and_then(|s| s.bundles.get(bundle))
            .copied()
            .unwrap_or(false)
    }

    pub fn excluded_fields(&self, entity_type: &str) -> &[String] {
        self.entity_types
            .get(entity_type)
            .map(|s| s.excluded_fields.as_slice())
            .unwrap_or(&[])
    }

    /// Enable an entity type (and optionally some of its bundles).
    pub fn enable(&mut self, entity_type: &str, bundles: &[&str]) -> &mut Self {
        let settings = self.entity_types.entry(entity_type.to_string()).or_default();
        settings.enable = true;
        for bundle in bundles {
            settings.bundles.insert((*bundle).to_string(), true);
        }
        self
    }
}

/// Read-only view combining the schema with the staging configuration.
#[derive(Debug, Clone, Copy)]
pub struct StagingScope<'a> {
    pub schema: &'a Schema,
    pub config: &'a StagingConfig,
}

impl<'a> StagingScope<'a> {
    pub fn new(schema: &'a Schema, config: &'a StagingConfig) -> Self {
        StagingScope { schema, config }
    }

    /// Entity types enabled for staging, in schema order.
    pub fn types(&self) -> impl Iterator<Item = &'a EntityTypeDescriptor> + 'a {
        let config = self.config;
        self.schema
            .entity_types
            .iter()
            .filter(move |et| config.entity_type_enabled(&et.id))
    }

    pub fn in_scope(&self, entity_type: &str) -> bool {
        self.config.entity_type_enabled(entity_type)
            && self.schema.entity_type(entity_type).is_some()
    }

    /// Staging-enabled bundles of a bundled entity type, sorted by id.
    pub fn enabled_bundles(&self, entity_type: &str) -> Vec<&'a str> {
        let config = self.config;
        self.schema
            .entity_type(entity_type)
            .map(|et| {
                et.bundles
                    .keys()
                    .filter(|b| config.bundle_enabled(entity_type, b))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bundles to stage for an entity type: its enabled bundles, or the
    /// entity type id itself when the type has no bundle concept.
    pub fn staged_bundles(&self, entity_type: &'a EntityTypeDescriptor) -> Vec<&'a str> {
        if entity_type.has_bundle() {
            self.enabled_bundles(&entity_type.id)
        } else {
            vec![entity_type.id.as_str()]
        }
    }
}
