//! Transform steps and the per-unit pipeline they form.
//!
//! A pipeline maps each destination property to either one step or an
//! ordered sequence of steps. Steps serialize with a `plugin` tag so the
//! plan-execution runtime can dispatch on it.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Row property holding the current row's language code.
pub const LANGCODE_SOURCE: &str = "@langcode";
/// Row property holding the menu a navigation link belongs to.
pub const MENU_NAME_SOURCE: &str = "@menu_name";
/// Row property holding the stable cross-system identifier.
pub const UUID_SOURCE: &str = "uuid";
/// Field of an asset entity holding its storage URI.
pub const ASSET_URI_FIELD: &str = "uri";
/// Row property the normalizer adds next to the asset URI, pointing at the
/// materialized copy inside the staging tree.
pub const FILEPATH_SOURCE: &str = "filepath";

/// Which language variants of a bundle a unit covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageVariant {
    /// The variant in each entity's own default language.
    DefaultLanguage,
    /// Every other language variant.
    Translations,
}

impl LanguageVariant {
    pub const ALL: [LanguageVariant; 2] =
        [LanguageVariant::DefaultLanguage, LanguageVariant::Translations];

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageVariant::DefaultLanguage => "default_language",
            LanguageVariant::Translations => "translations",
        }
    }
}

impl fmt::Display for LanguageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration unit identifier: `{entity_type}_{bundle}_{variant}`.
///
/// Bundle-less entity types pass their own id as `bundle`.
pub fn unit_id(entity_type: &str, bundle: &str, variant: LanguageVariant) -> String {
    format!("{}_{}_{}", entity_type, bundle, variant)
}

/// Reference to one or several migration units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MigrationRef {
    One(String),
    Many(Vec<String>),
}

impl MigrationRef {
    /// Collapse a target list: one element becomes a scalar reference,
    /// an empty list resolves to nothing.
    pub fn from_targets(mut targets: Vec<String>) -> Option<Self> {
        match targets.len() {
            0 => None,
            1 => targets.pop().map(MigrationRef::One),
            _ => Some(MigrationRef::Many(targets)),
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            MigrationRef::One(id) => std::slice::from_ref(id),
            MigrationRef::Many(ids) => ids,
        }
    }
}

/// One declarative instruction deriving a destination value from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plugin", rename_all = "snake_case")]
pub enum TransformStep {
    /// Straight copy of a row property.
    Copy { source: String },
    /// Copy of a row property in the row's own language.
    LocalizedGet { source: String, language: String },
    /// Resolve a source UUID to the id produced by another unit.
    #[serde(rename = "migration_lookup")]
    ReferenceLookup {
        migration: MigrationRef,
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        /// Do not create placeholder entities for unresolved references.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        no_stub: bool,
    },
    /// Like `ReferenceLookup`, yielding `[id, revision_id]` pairs.
    #[serde(rename = "revision_lookup")]
    RevisionReferenceLookup { migration: MigrationRef, source: String },
    /// Fan a list of tuples out into named sub-properties by position.
    #[serde(rename = "iterator")]
    Iterate { process: BTreeMap<String, usize> },
    /// Copy a binary asset; `source` is `[local path property, uri property]`.
    FileCopy { source: Vec<String> },
    /// Resolve a type-prefixed parent link within the current menu.
    #[serde(rename = "menu_link_parent")]
    MenuParentLookup {
        source: String,
        menu: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Constant value.
    #[serde(rename = "default_value")]
    Literal { value: serde_json::Value },
}

impl TransformStep {
    pub fn copy(source: impl Into<String>) -> Self {
        TransformStep::Copy {
            source: source.into(),
        }
    }

    pub fn localized_get(source: impl Into<String>) -> Self {
        TransformStep::LocalizedGet {
            source: source.into(),
            language: LANGCODE_SOURCE.to_string(),
        }
    }

    pub fn lookup(migration: MigrationRef, source: impl Into<String>) -> Self {
        TransformStep::ReferenceLookup {
            migration,
            source: source.into(),
            language: None,
            no_stub: false,
        }
    }

    /// The fixed fan-out following a revision lookup:
    /// `target_id` from position 0, `target_revision_id` from position 1.
    pub fn revision_fan_out() -> Self {
        TransformStep::Iterate {
            process: BTreeMap::from([
                ("target_id".to_string(), 0),
                ("target_revision_id".to_string(), 1),
            ]),
        }
    }

    /// Migration units this step refers to, if any.
    pub fn migration(&self) -> Option<&MigrationRef> {
        match self {
            TransformStep::ReferenceLookup { migration, .. }
            | TransformStep::RevisionReferenceLookup { migration, .. } => Some(migration),
            _ => None,
        }
    }
}

/// What a destination property maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Process {
    Single(TransformStep),
    Sequence(Vec<TransformStep>),
}

impl Process {
    pub fn steps(&self) -> &[TransformStep] {
        match self {
            Process::Single(step) => std::slice::from_ref(step),
            Process::Sequence(steps) => steps,
        }
    }
}

impl From<TransformStep> for Process {
    fn from(step: TransformStep) -> Self {
        Process::Single(step)
    }
}

/// Ordered mapping of destination property -> process.
///
/// Insertion order is kept and is the order the runtime evaluates
/// destinations in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    entries: Vec<(String, Process)>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-destination pipeline.
    pub fn single(destination: impl Into<String>, process: impl Into<Process>) -> Self {
        Pipeline {
            entries: vec![(destination.into(), process.into())],
        }
    }

    /// Builder-style [`insert`](Pipeline::insert).
    pub fn with(mut self, destination: impl Into<String>, process: impl Into<Process>) -> Self {
        self.insert(destination, process);
        self
    }

    /// Add a destination unless it is already mapped.
    ///
    /// Returns `false` (and keeps the existing mapping) on collision.
    pub fn insert(&mut self, destination: impl Into<String>, process: impl Into<Process>) -> bool {
        let destination = destination.into();
        if self.get(&destination).is_some() {
            return false;
        }
        self.entries.push((destination, process.into()));
        true
    }

    /// Add or replace a destination.
    pub fn set(&mut self, destination: impl Into<String>, process: impl Into<Process>) {
        let destination = destination.into();
        let process = process.into();
        match self.entries.iter_mut().find(|(d, _)| *d == destination) {
            Some((_, existing)) => *existing = process,
            None => self.entries.push((destination, process)),
        }
    }

    pub fn get(&self, destination: &str) -> Option<&Process> {
        self.entries
            .iter()
            .find(|(d, _)| d == destination)
            .map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Process)> {
        self.entries.iter().map(|(d, p)| (d.as_str(), p))
    }

    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Pipeline {
    type Item = (String, Process);
    type IntoIter = std::vec::IntoIter<(String, Process)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Pipeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (destination, process) in &self.entries {
            map.serialize_entry(destination, process)?;
        }
        map.end()
    }
}
