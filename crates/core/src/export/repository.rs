//! Content repository backed by a JSON dump file.
//!
//! ```json
//! {
//!   "entities": [
//!     { "entity_type": "node", "id": "1", "bundle": "article", "default_langcode": "en",
//!       "variants": [ { "langcode": "en", "fields": { "title": [{ "value": "Hello" }] } } ] }
//!   ],
//!   "aliases": [ { "path": "/node/1", "langcode": "en", "alias": "/hello", "pid": 4 } ],
//!   "parents": { "taxonomy_term": { "2": [ { "target_id": "1", "target_uuid": "..." } ] } },
//!   "files_root": "files"
//! }
//! ```
//!
//! A relative `files_root` is resolved against the dump file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use staging_schema::EntityTypeDescriptor;

use super::{ContentEntity, ContentRepository, PathAlias};
use crate::error::ExportError;
use crate::layout::asset_path;

#[derive(Debug, Clone, Deserialize)]
struct AliasEntry {
    path: String,
    langcode: String,
    alias: String,
    #[serde(default)]
    pid: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Dump {
    #[serde(default)]
    entities: Vec<ContentEntity>,
    #[serde(default)]
    aliases: Vec<AliasEntry>,
    #[serde(default)]
    parents: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
    #[serde(default)]
    files_root: Option<PathBuf>,
}

/// Read-only repository over a dump file.
#[derive(Debug, Clone, Default)]
pub struct JsonRepository {
    dump: Dump,
}

impl JsonRepository {
    /// Load a dump file.
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dump: Dump =
            serde_json::from_str(&content).map_err(|source| ExportError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let base = path.parent().unwrap_or(Path::new(""));
        dump.files_root = dump.files_root.take().map(|root| {
            if root.is_relative() {
                base.join(root)
            } else {
                root
            }
        });
        Ok(JsonRepository { dump })
    }

    /// Override where asset binaries are read from.
    pub fn with_files_root(mut self, files_root: impl Into<PathBuf>) -> Self {
        self.dump.files_root = Some(files_root.into());
        self
    }

    pub fn entity_count(&self) -> usize {
        self.dump.entities.len()
    }
}

impl ContentRepository for JsonRepository {
    fn load_entities(
        &self,
        entity_type: &EntityTypeDescriptor,
        bundle: Option<&str>,
    ) -> Result<Vec<ContentEntity>, ExportError> {
        Ok(self
            .dump
            .entities
            .iter()
            .filter(|e| e.entity_type == entity_type.id)
            .filter(|e| bundle.is_none() || e.bundle.as_deref() == bundle)
            .cloned()
            .collect())
    }

    fn path_alias(&self, path: &str, langcode: &str) -> Option<PathAlias> {
        self.dump
            .aliases
            .iter()
            .find(|a| a.path == path && a.langcode == langcode)
            .map(|a| PathAlias {
                pid: a.pid,
                alias: a.alias.clone(),
            })
    }

    fn parents(&self, entity_type: &str, entity_id: &str) -> Vec<Value> {
        self.dump
            .parents
            .get(entity_type)
            .and_then(|by_id| by_id.get(entity_id))
            .cloned()
            .unwrap_or_default()
    }

    fn asset_location(&self, uri: &str) -> Option<PathBuf> {
        let root = self.dump.files_root.as_ref()?;
        asset_path(root, uri).filter(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures;
    use serde_json::json;

    fn write_dump(dir: &Path) -> PathBuf {
        let path = dir.join("dump.json");
        std::fs::write(
            &path,
            json!({
                "entities": [
                    { "entity_type": "node", "id": "1", "bundle": "article", "default_langcode": "en",
                      "variants": [ { "langcode": "en", "fields": {} } ] },
                    { "entity_type": "node", "id": "2", "bundle": "page", "default_langcode": "en",
                      "variants": [ { "langcode": "en", "fields": {} } ] }
                ],
                "aliases": [ { "path": "/node/1", "langcode": "en", "alias": "/hello", "pid": 4 } ],
                "parents": { "taxonomy_term": { "2": [ { "target_id": "1" } ] } },
                "files_root": "assets"
            })
            .to_string(),
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_and_filters_by_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonRepository::load(&write_dump(dir.path())).unwrap();
        let schema = fixtures::schema();
        let node = schema.entity_type("node").unwrap();

        assert_eq!(repo.entity_count(), 2);
        assert_eq!(repo.load_entities(node, None).unwrap().len(), 2);
        let pages = repo.load_entities(node, Some("page")).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "2");
    }

    #[test]
    fn answers_aliases_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonRepository::load(&write_dump(dir.path())).unwrap();
        assert_eq!(
            repo.path_alias("/node/1", "en"),
            Some(PathAlias { pid: 4, alias: "/hello".into() })
        );
        assert_eq!(repo.path_alias("/node/1", "fr"), None);
        assert_eq!(repo.parents("taxonomy_term", "2"), vec![json!({ "target_id": "1" })]);
        assert!(repo.parents("taxonomy_term", "9").is_empty());
    }

    #[test]
    fn relative_files_root_resolves_next_to_dump() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets/2024")).unwrap();
        std::fs::write(dir.path().join("assets/2024/a.txt"), "a").unwrap();
        let repo = JsonRepository::load(&write_dump(dir.path())).unwrap();
        assert_eq!(
            repo.asset_location("public://2024/a.txt"),
            Some(dir.path().join("assets/2024/a.txt"))
        );
        assert_eq!(repo.asset_location("public://2024/b.txt"), None);
    }

    #[test]
    fn missing_dump_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonRepository::load(&dir.path().join("nope.json")),
            Err(ExportError::Read { .. })
        ));
    }
}
