//! End-to-end plan compilation against on-disk snapshot trees.
//!
//! Each test lays out a staging root in a temp dir, compiles the plan into a
//! store and inspects the saved records.

use std::path::Path;

use serde_json::{json, Value};
use staging_core::{
    normalize_record, read_snapshot_file, Exporter, JsonRepository, NormalizeOptions, Planner,
};
use staging_schema::{from_schema_json, Schema, StagingConfig, StagingScope};
use staging_store::{DirectoryPlanStore, MemoryPlanStore, PlanStore};
use tempfile::TempDir;

fn touch(root: &Path, entity_type: &str, variant: &str, bundle: &str) {
    let dir = root.join(entity_type).join(variant);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{bundle}.json")), "[]").unwrap();
}

/// `A` with bundle `p`, translatable; `B` without bundles; `Target` with
/// bundles `x` and `y`; `Comp` composite with bundles `c1`, `c2`.
fn schema() -> Schema {
    from_schema_json(&json!({ "entity_types": [
        {
            "id": "A", "label": "A", "translatable": true,
            "keys": { "id": "aid", "bundle": "type", "uuid": "uuid" },
            "bundles": { "p": "P" },
            "fields": { "p": [
                { "name": "aid", "type": "scalar" },
                { "name": "title", "type": "scalar", "translatable": true },
                { "name": "owner", "type": "entity_reference", "settings": { "target_type": "B" } },
                { "name": "related", "type": "entity_reference", "settings": { "target_type": "Target" } },
                { "name": "linked", "type": "entity_reference",
                  "settings": { "target_type": "Target", "target_bundles": [] } },
                { "name": "parts", "type": "entity_reference_revisions",
                  "settings": { "target_type": "Comp", "target_bundles": ["c1", "c2"] } },
                { "name": "same", "type": "entity_reference", "settings": { "target_type": "A" } }
            ]}
        },
        {
            "id": "B", "label": "B",
            "keys": { "id": "bid", "uuid": "uuid" },
            "fields": { "B": [ { "name": "bid", "type": "scalar" }, { "name": "name", "type": "scalar" } ] }
        },
        {
            "id": "Target", "label": "Target",
            "keys": { "id": "tid", "bundle": "type" },
            "bundles": { "x": "X", "y": "Y" }
        },
        {
            "id": "Comp", "label": "Comp", "kind": "composite",
            "keys": { "id": "id", "bundle": "type", "revision": "revision_id" },
            "bundles": { "c1": "C1", "c2": "C2" }
        }
    ]}))
    .unwrap()
}

fn config() -> StagingConfig {
    let mut config = StagingConfig::default();
    config
        .enable("A", &["p"])
        .enable("B", &[])
        .enable("Target", &["x", "y"])
        .enable("Comp", &["c1", "c2"]);
    config
}

fn staged_tree() -> TempDir {
    let root = TempDir::new().unwrap();
    touch(root.path(), "A", "default_language", "p");
    touch(root.path(), "A", "translations", "p");
    touch(root.path(), "B", "default_language", "B");
    touch(root.path(), "Target", "default_language", "x");
    touch(root.path(), "Target", "default_language", "y");
    touch(root.path(), "Comp", "default_language", "c1");
    root
}

fn compile(root: &Path) -> MemoryPlanStore {
    let schema = schema();
    let config = config();
    let planner = Planner::new(StagingScope::new(&schema, &config), root);
    let mut store = MemoryPlanStore::new();
    planner.compile_plan(&mut store).unwrap();
    store
}

#[test]
fn scenario_owner_reference_and_localized_title() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("A_p_default_language").unwrap();

    assert_eq!(
        unit.process["title"],
        json!({ "plugin": "localized_get", "source": "title", "language": "@langcode" })
    );
    assert_eq!(
        unit.process["owner"],
        json!({ "plugin": "migration_lookup", "migration": "B_B_default_language", "source": "owner" })
    );
    assert!(unit.dependencies.contains(&"B_B_default_language".to_string()));
}

#[test]
fn scenario_no_allow_list_targets_all_enabled_bundles() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("A_p_default_language").unwrap();

    assert_eq!(
        unit.process["related"]["migration"],
        json!(["Target_x_default_language", "Target_y_default_language"])
    );
    for id in ["Target_x_default_language", "Target_y_default_language"] {
        assert!(unit.dependencies.contains(&id.to_string()), "missing {id}");
    }
}

#[test]
fn scenario_empty_allow_list_targets_all_enabled_bundles() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("A_p_default_language").unwrap();

    assert_eq!(
        unit.process["linked"],
        json!({ "plugin": "migration_lookup",
                "migration": ["Target_x_default_language", "Target_y_default_language"],
                "source": "linked" })
    );
}

#[test]
fn scenario_translation_unit_looks_up_identity() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("A_p_translations").unwrap();

    assert_eq!(
        unit.process["aid"],
        json!({ "plugin": "migration_lookup", "migration": "A_p_default_language", "source": "uuid" })
    );
    assert!(unit.destination.translations);
    assert!(unit.dependencies.contains(&"A_p_default_language".to_string()));
}

#[test]
fn scenario_revision_field_fans_out() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("A_p_default_language").unwrap();

    assert_eq!(
        unit.process["parts"],
        json!([
            { "plugin": "revision_lookup",
              "migration": ["Comp_c1_default_language", "Comp_c2_default_language"],
              "source": "parts" },
            { "plugin": "iterator", "process": { "target_id": 0, "target_revision_id": 1 } }
        ])
    );
}

#[test]
fn bundle_less_type_gets_doubled_id() {
    let root = staged_tree();
    let store = compile(root.path());
    let unit = store.get("B_B_default_language").unwrap();
    assert_eq!(unit.destination.plugin, "entity:B");
    assert!(store.get("B_B_translations").is_none());
}

#[test]
fn no_unit_depends_on_itself() {
    let root = staged_tree();
    let store = compile(root.path());
    let records = store.load_namespace("content_staging").unwrap();
    assert!(!records.is_empty());
    for record in &records {
        assert!(
            !record.dependencies.contains(&record.id),
            "{} depends on itself",
            record.id
        );
    }
    // `same` points back at A_p_default_language.
    let unit = store.get("A_p_default_language").unwrap();
    assert_eq!(unit.process["same"]["migration"], json!("A_p_default_language"));
}

#[test]
fn units_only_for_exported_snapshots() {
    let root = staged_tree();
    let schema = schema();
    let config = config();
    let planner = Planner::new(StagingScope::new(&schema, &config), root.path());
    let mut store = MemoryPlanStore::new();
    let report = planner.compile_plan(&mut store).unwrap();

    assert_eq!(report.units.len(), 6);
    assert_eq!(report.missing, vec!["Comp_c2_default_language".to_string()]);
    assert!(store.get("Comp_c2_default_language").is_none());
    let comp = store.get("Comp_c1_default_language").unwrap();
    assert_eq!(comp.destination.plugin, "entity_reference_revisions:Comp");
}

#[test]
fn recompiling_is_idempotent_and_discards_stale_units() {
    let root = staged_tree();
    let plans = TempDir::new().unwrap();
    let schema = schema();
    let config = config();
    let planner = Planner::new(StagingScope::new(&schema, &config), root.path());
    let mut store = DirectoryPlanStore::new(plans.path());

    let first_report = planner.compile_plan(&mut store).unwrap();
    assert_eq!(first_report.discarded, 0);
    let mut first: Vec<(String, String)> = std::fs::read_dir(plans.path())
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            (path.display().to_string(), std::fs::read_to_string(&path).unwrap())
        })
        .collect();

    let second_report = planner.compile_plan(&mut store).unwrap();
    assert_eq!(second_report.discarded, first_report.units.len());
    let mut second: Vec<(String, String)> = std::fs::read_dir(plans.path())
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            (path.display().to_string(), std::fs::read_to_string(&path).unwrap())
        })
        .collect();
    first.sort();
    second.sort();
    assert_eq!(first, second);

    // A snapshot removed between runs drops its unit.
    std::fs::remove_file(root.path().join("Target/default_language/y.json")).unwrap();
    planner.compile_plan(&mut store).unwrap();
    let ids: Vec<String> = store
        .load_namespace("content_staging")
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert!(!ids.contains(&"Target_y_default_language".to_string()));
    assert_eq!(ids.len(), 5);
}

#[test]
fn verification_skips_malformed_snapshots() {
    let root = staged_tree();
    std::fs::write(root.path().join("B/default_language/B.json"), "{ broken").unwrap();
    let schema = schema();
    let config = config();
    let planner = Planner::new(StagingScope::new(&schema, &config), root.path());
    let mut store = MemoryPlanStore::new();
    let report = planner.compile_plan(&mut store).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].unit_id, "B_B_default_language");
    assert!(store.get("B_B_default_language").is_none());
    assert!(store.get("A_p_default_language").is_some());
}

#[test]
fn unverified_plan_keeps_malformed_snapshot_units() {
    let root = staged_tree();
    std::fs::write(root.path().join("B/default_language/B.json"), "{ broken").unwrap();
    let schema = schema();
    let mut config = config();
    config.staging.verify_snapshots = false;
    let planner = Planner::new(StagingScope::new(&schema, &config), root.path());
    let mut store = MemoryPlanStore::new();
    let report = planner.compile_plan(&mut store).unwrap();

    assert!(report.failed.is_empty());
    assert!(store.get("B_B_default_language").is_some());
}

#[test]
fn export_then_plan_then_normalize() {
    let work = TempDir::new().unwrap();
    let stage = work.path().join("staging");
    let dump = work.path().join("dump.json");
    std::fs::write(
        &dump,
        json!({ "entities": [
            { "entity_type": "A", "id": "1", "bundle": "p", "default_langcode": "en",
              "variants": [
                { "langcode": "en", "fields": {
                    "uuid": [{ "value": "a-1" }],
                    "title": [{ "value": "Hello" }],
                    "owner": [{ "target_id": 3, "target_uuid": "b-3" }]
                }},
                { "langcode": "fr", "fields": {
                    "uuid": [{ "value": "a-1" }],
                    "title": [{ "value": "Bonjour" }]
                }}
              ] },
            { "entity_type": "B", "id": "3", "default_langcode": "en",
              "variants": [ { "langcode": "en", "fields": { "uuid": [{ "value": "b-3" }] } } ] }
        ]})
        .to_string(),
    )
    .unwrap();

    let schema = schema();
    let config = config();
    let scope = StagingScope::new(&schema, &config);
    let repository = JsonRepository::load(&dump).unwrap();
    let exported = Exporter::new(scope, &repository, &stage).export_all(None).unwrap();
    assert_eq!(exported.files.len(), 3);

    let mut store = MemoryPlanStore::new();
    let report = Planner::new(scope, &stage).compile_plan(&mut store).unwrap();
    assert_eq!(
        report.units,
        vec![
            "A_p_default_language".to_string(),
            "A_p_translations".to_string(),
            "B_B_default_language".to_string(),
        ]
    );

    let rows = read_snapshot_file(
        &stage.join("A/default_language/p.json"),
        &NormalizeOptions::new(&stage),
    )
    .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["uuid"], json!("a-1"));
    assert_eq!(rows[0]["title"], json!("Hello"));
    assert_eq!(rows[0]["owner"], json!("b-3"));
}

#[test]
fn normalized_scalar_survives() {
    let record: serde_json::Map<String, Value> =
        serde_json::from_value(json!({ "status": true, "uuid": "x" })).unwrap();
    let row = normalize_record(&record, &NormalizeOptions::new(Path::new("/nowhere")));
    assert_eq!(row["status"], json!(true));
    assert_eq!(row["uuid"], json!("x"));
}
