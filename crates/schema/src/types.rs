//! Typed structs describing the host content schema.
//!
//! Descriptors are immutable once loaded. Field lists keep the order of the
//! schema document so that compiled pipelines are deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Behavioural family of an entity type.
///
/// Several rules and export hooks only apply to one family (composite
/// entities keep their revision id, asset entities carry a storage path,
/// account entities never get placeholder stubs, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Content,
    /// Revisionable sub-entity embedded in a host entity (paragraph-like).
    Composite,
    /// Binary asset whose storage path is exported alongside the snapshot.
    Asset,
    /// Hierarchical navigation link (menu-link-like).
    NavigationLink,
    /// User account.
    Account,
    /// Ordered queue of other entities.
    Queue,
}

/// Named entity keys. Each key is optional: a bundle-less entity type has no
/// `bundle` key, a non-revisionable one no `revision` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langcode: Option<String>,
}

/// Static description of one content entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeDescriptor {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub keys: EntityKeys,
    #[serde(default)]
    pub translatable: bool,
    /// Keep the source UUID on import instead of letting the target mint one.
    #[serde(default)]
    pub preserve_uuid: bool,
    /// Internal canonical path template, e.g. `/node/{id}`. Absent for
    /// entity types without a canonical URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_path: Option<String>,
    /// Destination properties not modeled by any field descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synthetic_properties: Vec<String>,
    /// Bundle id -> human label.
    #[serde(default)]
    pub bundles: BTreeMap<String, String>,
    /// Bundle id -> field descriptors. Bundle-less types key their fields
    /// by the entity type id.
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldDescriptor>>,
}

impl EntityTypeDescriptor {
    /// Whether this entity type is split into bundles.
    pub fn has_bundle(&self) -> bool {
        self.keys.bundle.is_some()
    }

    pub fn is_composite(&self) -> bool {
        self.kind == EntityKind::Composite
    }

    pub fn is_id_key(&self, field_name: &str) -> bool {
        self.keys.id.as_deref() == Some(field_name)
    }

    pub fn is_revision_key(&self, field_name: &str) -> bool {
        self.keys.revision.as_deref() == Some(field_name)
    }

    pub fn is_uuid_key(&self, field_name: &str) -> bool {
        self.keys.uuid.as_deref() == Some(field_name)
    }

    /// Field descriptors for a bundle, in schema order.
    pub fn fields_for(&self, bundle: &str) -> &[FieldDescriptor] {
        self.fields.get(bundle).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Human label for a bundle. Falls back to the bundle id; bundle-less
    /// types have an empty bundle label.
    pub fn bundle_label<'a>(&'a self, bundle: &'a str) -> &'a str {
        if !self.has_bundle() {
            return "";
        }
        self.bundles
            .get(bundle)
            .map(String::as_str)
            .unwrap_or(bundle)
    }

    /// Resolve the canonical internal path of one entity, if this type has one.
    pub fn canonical_path_for(&self, entity_id: &str) -> Option<String> {
        self.canonical_path
            .as_ref()
            .map(|template| template.replace("{id}", entity_id))
    }
}

/// Declared storage type of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Scalar,
    EntityReference,
    EntityReferenceRevisions,
    ImageOrFile,
    #[serde(other)]
    Other,
}

/// Settings attached to reference-typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSettings {
    pub target_type: String,
    /// Explicit bundle allow-list. `None` means "every bundle of the target".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bundles: Option<Vec<String>>,
    /// Marks a self-referencing parent relation (e.g. a term's parent term).
    #[serde(default)]
    pub hierarchy: bool,
}

/// Static description of one field of an (entity type, bundle) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FieldSettings>,
}

impl FieldDescriptor {
    /// Plain scalar field, mostly useful for building fixtures.
    pub fn scalar(name: impl Into<String>, translatable: bool) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type: FieldType::Scalar,
            translatable,
            settings: None,
        }
    }

    /// Reference field of the given type pointing at `target_type`.
    pub fn reference(
        name: impl Into<String>,
        field_type: FieldType,
        target_type: impl Into<String>,
        target_bundles: Option<Vec<String>>,
    ) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            translatable: false,
            settings: Some(FieldSettings {
                target_type: target_type.into(),
                target_bundles,
                hierarchy: false,
            }),
        }
    }

    pub fn target_type(&self) -> Option<&str> {
        self.settings.as_ref().map(|s| s.target_type.as_str())
    }

    pub fn target_bundles(&self) -> Option<&[String]> {
        self.settings
            .as_ref()
            .and_then(|s| s.target_bundles.as_deref())
    }

    pub fn is_hierarchy(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.hierarchy)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self.field_type,
            FieldType::EntityReference | FieldType::EntityReferenceRevisions
        )
    }
}

/// The full host schema snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub entity_types: Vec<EntityTypeDescriptor>,
}

impl Schema {
    pub fn entity_type(&self, id: &str) -> Option<&EntityTypeDescriptor> {
        self.entity_types.iter().find(|et| et.id == id)
    }

    /// The entity type holding binary assets, if the schema declares one.
    pub fn asset_type(&self) -> Option<&EntityTypeDescriptor> {
        self.entity_types
            .iter()
            .find(|et| et.kind == EntityKind::Asset)
    }
}
