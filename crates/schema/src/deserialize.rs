//! Deserialization of a schema document into typed descriptors.
//!
//! The main entry point is [`from_schema_json`], which takes a
//! `&serde_json::Value` and produces a validated [`Schema`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::types::*;

/// Errors while loading a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("could not read schema '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("entity type '{id}' is declared more than once")]
    DuplicateEntityType { id: String },

    /// A reference-typed field has no target settings.
    #[error("field '{entity_type}.{field}' is a reference field without settings")]
    MissingSettings { entity_type: String, field: String },

    /// Fields are keyed by a bundle the entity type does not declare.
    #[error("entity type '{entity_type}' has fields for unknown bundle '{bundle}'")]
    UnknownBundle { entity_type: String, bundle: String },
}

/// Deserialize a schema document and check its internal consistency.
pub fn from_schema_json(doc: &serde_json::Value) -> Result<Schema, SchemaError> {
    let schema: Schema = serde_json::from_value(doc.clone())?;
    validate(&schema)?;
    Ok(schema)
}

/// Read, parse and validate a schema file.
pub fn load_schema(path: &Path) -> Result<Schema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: serde_json::Value = serde_json::from_str(&content)?;
    from_schema_json(&doc)
}

fn validate(schema: &Schema) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    for et in &schema.entity_types {
        if !seen.insert(et.id.as_str()) {
            return Err(SchemaError::DuplicateEntityType { id: et.id.clone() });
        }

        for (bundle, fields) in &et.fields {
            let known = if et.has_bundle() {
                et.bundles.contains_key(bundle)
            } else {
                bundle == &et.id
            };
            if !known {
                return Err(SchemaError::UnknownBundle {
                    entity_type: et.id.clone(),
                    bundle: bundle.clone(),
                });
            }

            if let Some(field) = fields
                .iter()
                .find(|f| f.is_reference() && f.settings.is_none())
            {
                return Err(SchemaError::MissingSettings {
                    entity_type: et.id.clone(),
                    field: field.name.clone(),
                });
            }
        }
    }
    Ok(())
}
