//! Row normalizer: exported field value trees -> flat rows.
//!
//! Exported fields are lists of value entries, each entry an object whose
//! shape depends on the field type (`{"value": ..}`, `{"target_id": ..}`,
//! `{"target_uuid": .., "alt": .., "title": ..}`, `{"pid": .., "alias": ..}`,
//! ...). [`classify`] maps one raw field to a closed [`RawFieldValue`];
//! [`normalize_record`] flattens a whole record into a [`Row`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::NormalizeError;
use crate::layout::{asset_path, FILES_DIR};
use crate::step::{ASSET_URI_FIELD, FILEPATH_SOURCE, UUID_SOURCE};

/// Legacy keys referencing config-like targets by numeric/machine id.
pub const NUMERIC_TARGET_FIELDS: [&str; 5] = ["type", "shortcut_set", "vid", "bundle", "queue"];

/// One normalized row: property name -> canonical value.
pub type Row = BTreeMap<String, Value>;

/// Canonical shape of one exported field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFieldValue {
    /// No entries, or an entry with no content.
    Empty,
    /// Already a scalar; passed through.
    Scalar(Value),
    /// Legacy reference by target id.
    NumericRef(Value),
    /// Reference by cross-system UUID, optionally with image companions.
    UuidRef {
        uuid: Value,
        alt: Option<Value>,
        title: Option<Value>,
    },
    /// Multi-valued reference: the UUIDs in entry order.
    UuidList(Vec<Value>),
    /// Multi-valued plain field or scalar entry, kept as exported.
    List(Value),
    /// Entry carrying a simple `value`.
    Value(Value),
    /// Path alias record.
    PathAlias(Value),
    /// Anything else, unchanged.
    Raw(Value),
}

impl RawFieldValue {
    /// The value the row holds under the field's own name.
    pub fn into_value(self) -> Value {
        match self {
            RawFieldValue::Empty => Value::Null,
            RawFieldValue::UuidRef { uuid, .. } => uuid,
            RawFieldValue::UuidList(uuids) => Value::Array(uuids),
            RawFieldValue::Scalar(v)
            | RawFieldValue::NumericRef(v)
            | RawFieldValue::List(v)
            | RawFieldValue::Value(v)
            | RawFieldValue::PathAlias(v)
            | RawFieldValue::Raw(v) => v,
        }
    }
}

/// Present and non-null.
fn member<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    item.as_object()
        .and_then(|o| o.get(key))
        .filter(|v| !v.is_null())
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn entry_count(value: &Value) -> usize {
    match value {
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => 1,
    }
}

/// A single entry stands for the field; several entries stand together.
fn pick_item(list: &Value) -> Value {
    match list {
        Value::Array(a) if a.len() == 1 => a[0].clone(),
        Value::Object(o) if o.len() == 1 => o.values().next().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

/// Classify one exported field. First matching shape wins.
pub fn classify(key: &str, raw: &Value) -> RawFieldValue {
    match raw {
        Value::Null => return RawFieldValue::Empty,
        Value::Array(_) | Value::Object(_) => {}
        scalar => return RawFieldValue::Scalar(scalar.clone()),
    }

    let item = pick_item(raw);
    if is_empty(&item) {
        return RawFieldValue::Empty;
    }

    if NUMERIC_TARGET_FIELDS.contains(&key) {
        if let Some(target) = member(&item, "target_id") {
            return RawFieldValue::NumericRef(target.clone());
        }
    }

    if let Some(uuid) = member(&item, "target_uuid") {
        let (alt, title) = match (member(&item, "alt"), member(&item, "title")) {
            (Some(alt), Some(title)) => (Some(alt.clone()), Some(title.clone())),
            _ => (None, None),
        };
        return RawFieldValue::UuidRef {
            uuid: uuid.clone(),
            alt,
            title,
        };
    }

    let composite = matches!(item, Value::Array(_) | Value::Object(_));
    if !composite || (entry_count(&item) != 1 && member(&item, "pid").is_none()) {
        if let Value::Array(entries) = &item {
            if entries
                .first()
                .is_some_and(|first| member(first, "target_uuid").is_some())
            {
                let uuids = entries
                    .iter()
                    .map(|e| member(e, "target_uuid").cloned().unwrap_or(Value::Null))
                    .collect();
                return RawFieldValue::UuidList(uuids);
            }
        }
        return RawFieldValue::List(item);
    }

    if let Some(value) = member(&item, "value") {
        return RawFieldValue::Value(value.clone());
    }

    if member(&item, "pid").is_some() {
        let alias = item.get("alias").cloned().unwrap_or(Value::Null);
        return RawFieldValue::PathAlias(alias);
    }

    RawFieldValue::Raw(item)
}

/// Where assets live and which field holds their URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub files_dir: PathBuf,
    /// Field whose value gets a `filepath` companion. `None` disables it.
    pub asset_uri_field: Option<String>,
}

impl NormalizeOptions {
    /// Options for a staging tree rooted at `staging_root`.
    pub fn new(staging_root: &Path) -> Self {
        let files_dir = staging_root.join(FILES_DIR);
        NormalizeOptions {
            files_dir: std::fs::canonicalize(&files_dir).unwrap_or(files_dir),
            asset_uri_field: Some(ASSET_URI_FIELD.to_string()),
        }
    }

    pub fn with_files_dir(mut self, files_dir: impl Into<PathBuf>) -> Self {
        self.files_dir = files_dir.into();
        self
    }
}

/// Flatten one exported record.
///
/// Every input key appears in the output (empty fields as `null`), plus the
/// `{field}_alt` / `{field}_title` companions of image references and the
/// `filepath` of an asset record.
pub fn normalize_record(record: &Map<String, Value>, options: &NormalizeOptions) -> Row {
    let mut row = Row::new();
    for (key, raw) in record {
        let classified = classify(key, raw);
        if let RawFieldValue::UuidRef {
            alt: Some(alt),
            title: Some(title),
            ..
        } = &classified
        {
            row.insert(format!("{}_alt", key), alt.clone());
            row.insert(format!("{}_title", key), title.clone());
        }
        let value = classified.into_value();

        if options.asset_uri_field.as_deref() == Some(key.as_str()) {
            if let Some(uri) = value.as_str() {
                match asset_path(&options.files_dir, uri) {
                    Some(path) => {
                        row.insert(
                            FILEPATH_SOURCE.to_string(),
                            Value::String(path.to_string_lossy().into_owned()),
                        );
                    }
                    None => tracing::warn!(uri, "asset uri escapes the files directory"),
                }
            }
        }
        row.insert(key.clone(), value);
    }
    row
}

/// Parse a snapshot file into its records, without normalizing them.
///
/// Accepts a top-level array or a single-key object wrapping one
/// (`{"node": [...]}`).
pub fn load_snapshot_records(path: &Path) -> Result<Vec<Map<String, Value>>, NormalizeError> {
    let content = std::fs::read_to_string(path).map_err(|source| NormalizeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&content).map_err(|source| NormalizeError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let shape = |message: &str| NormalizeError::Shape {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let records = match doc {
        Value::Array(records) => records,
        Value::Object(mut wrapper) if wrapper.len() == 1 => {
            match wrapper.values_mut().next().map(Value::take) {
                Some(Value::Array(records)) => records,
                _ => return Err(shape("wrapped snapshot is not an array")),
            }
        }
        _ => return Err(shape("expected an array of records")),
    };

    records
        .into_iter()
        .map(|record| match record {
            Value::Object(fields) => Ok(fields),
            _ => Err(shape("record is not an object")),
        })
        .collect()
}

/// Reduce the exported `uuid` field (`[{"value": ".."}]`) to its scalar.
fn flatten_uuid(record: &mut Map<String, Value>) {
    if let Some(uuid) = record.get_mut(UUID_SOURCE) {
        if uuid.is_array() || uuid.is_object() {
            let flat = member(&pick_item(uuid), "value")
                .cloned()
                .unwrap_or(Value::Null);
            *uuid = flat;
        }
    }
}

/// Read a snapshot file and normalize every record in it.
pub fn read_snapshot_file(path: &Path, options: &NormalizeOptions) -> Result<Vec<Row>, NormalizeError> {
    let records = load_snapshot_records(path)?;
    tracing::debug!(path = %path.display(), records = records.len(), "read snapshot");
    Ok(records
        .into_iter()
        .map(|mut record| {
            flatten_uuid(&mut record);
            normalize_record(&record, options)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            files_dir: PathBuf::from("/stage/files"),
            asset_uri_field: Some("uri".into()),
        }
    }

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(classify("uuid", &json!("abc")), RawFieldValue::Scalar(json!("abc")));
        assert_eq!(classify("weight", &json!(0)), RawFieldValue::Scalar(json!(0)));
    }

    #[test]
    fn simple_value_entry() {
        assert_eq!(
            classify("title", &json!([{ "value": "Hello" }])),
            RawFieldValue::Value(json!("Hello"))
        );
    }

    #[test]
    fn numeric_target_only_for_legacy_keys() {
        assert_eq!(
            classify("type", &json!([{ "target_id": "article" }])),
            RawFieldValue::NumericRef(json!("article"))
        );
        // Same shape under another key is not a legacy reference.
        assert_eq!(
            classify("uid", &json!([{ "target_id": 5 }])),
            RawFieldValue::Raw(json!({ "target_id": 5 }))
        );
    }

    #[test]
    fn uuid_reference_with_companions() {
        let raw = json!([{ "target_id": 3, "target_uuid": "f-1", "alt": "A cat", "title": "Cat" }]);
        assert_eq!(
            classify("image", &raw),
            RawFieldValue::UuidRef {
                uuid: json!("f-1"),
                alt: Some(json!("A cat")),
                title: Some(json!("Cat")),
            }
        );

        let row = normalize_record(&record(json!({ "image": raw })), &options());
        assert_eq!(row.len(), 3);
        assert_eq!(row["image"], json!("f-1"));
        assert_eq!(row["image_alt"], json!("A cat"));
        assert_eq!(row["image_title"], json!("Cat"));
    }

    #[test]
    fn uuid_reference_without_both_companions() {
        let row = normalize_record(
            &record(json!({ "uid": [{ "target_id": 1, "target_uuid": "u-1", "alt": "x" }] })),
            &options(),
        );
        assert_eq!(row.len(), 1);
        assert_eq!(row["uid"], json!("u-1"));
    }

    #[test]
    fn multi_valued_references_become_uuid_list() {
        let raw = json!([
            { "target_id": 1, "target_uuid": "t-1" },
            { "target_id": 2, "target_uuid": "t-2" }
        ]);
        assert_eq!(
            classify("tags", &raw),
            RawFieldValue::UuidList(vec![json!("t-1"), json!("t-2")])
        );
    }

    #[test]
    fn multi_valued_plain_field_kept_as_is() {
        let raw = json!([{ "value": "a" }, { "value": "b" }]);
        assert_eq!(classify("keywords", &raw), RawFieldValue::List(raw.clone()));
    }

    #[test]
    fn formatted_text_entry_kept_whole() {
        let raw = json!([{ "value": "<p>Hi</p>", "format": "basic_html" }]);
        assert_eq!(
            classify("body", &raw),
            RawFieldValue::List(json!({ "value": "<p>Hi</p>", "format": "basic_html" }))
        );
    }

    #[test]
    fn path_alias_entry() {
        let raw = json!([{ "alias": "/about", "pid": 7, "langcode": "en" }]);
        assert_eq!(classify("path", &raw), RawFieldValue::PathAlias(json!("/about")));
    }

    #[test]
    fn empty_entries_become_null() {
        let row = normalize_record(
            &record(json!({ "field_tags": [], "body": [{}], "summary": null })),
            &options(),
        );
        assert_eq!(row.len(), 3);
        assert!(row.values().all(Value::is_null));
    }

    #[test]
    fn asset_uri_gets_filepath() {
        let row = normalize_record(
            &record(json!({ "uri": [{ "value": "public://2024/cat.png" }] })),
            &options(),
        );
        assert_eq!(row["uri"], json!("public://2024/cat.png"));
        assert_eq!(row["filepath"], json!("/stage/files/2024/cat.png"));
    }

    #[test]
    fn escaping_asset_uri_gets_no_filepath() {
        let row = normalize_record(
            &record(json!({ "uri": [{ "value": "public://../../root/x" }] })),
            &options(),
        );
        assert_eq!(row["uri"], json!("public://../../root/x"));
        assert!(!row.contains_key("filepath"));

        let row = normalize_record(
            &record(json!({ "uri": [{ "value": "public:///etc/x" }] })),
            &options(),
        );
        assert_eq!(row["filepath"], json!("/stage/files/etc/x"));
    }

    #[test]
    fn reads_wrapped_snapshot_and_flattens_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("article.json");
        std::fs::write(
            &path,
            json!({ "node": [
                { "uuid": [{ "value": "n-1" }], "title": [{ "value": "One" }] }
            ]})
            .to_string(),
        )
        .unwrap();

        let rows = read_snapshot_file(&path, &options()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["uuid"], json!("n-1"));
        assert_eq!(rows[0]["title"], json!("One"));
    }

    #[test]
    fn reads_bare_array_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, r#"[{"uuid":[{"value":"u-1"}]},{"uuid":[{"value":"u-2"}]}]"#).unwrap();
        let rows = read_snapshot_file(&path, &options()).unwrap();
        let uuids: Vec<&Value> = rows.iter().map(|r| &r["uuid"]).collect();
        assert_eq!(uuids, vec![&json!("u-1"), &json!("u-2")]);
    }

    #[test]
    fn malformed_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_snapshot_file(&path, &options()),
            Err(NormalizeError::Parse { .. })
        ));

        std::fs::write(&path, r#"{"a": [], "b": []}"#).unwrap();
        assert!(matches!(
            read_snapshot_file(&path, &options()),
            Err(NormalizeError::Shape { .. })
        ));
    }
}
