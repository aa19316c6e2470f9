use super::{make_record, TestResult};
use crate::PlanStore;

pub(super) fn run_save_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: PlanStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "save",
            "saved_record_is_loadable",
            saved_record_is_loadable(factory),
        ),
        TestResult::from_result(
            "save",
            "save_replaces_same_id",
            save_replaces_same_id(factory),
        ),
        TestResult::from_result(
            "save",
            "load_is_sorted_by_id",
            load_is_sorted_by_id(factory),
        ),
        TestResult::from_result(
            "save",
            "empty_store_loads_nothing",
            empty_store_loads_nothing(factory),
        ),
    ]
}

fn saved_record_is_loadable<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    let record = make_record("node_article_default_language", "content_staging");
    store.save(&record).map_err(|e| e.to_string())?;

    let loaded = store
        .load_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if loaded != vec![record] {
        return Err(format!("loaded records differ: {:?}", loaded));
    }
    Ok(())
}

fn save_replaces_same_id<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    let mut record = make_record("node_article_default_language", "content_staging");
    store.save(&record).map_err(|e| e.to_string())?;
    record.dependencies.clear();
    store.save(&record).map_err(|e| e.to_string())?;

    let loaded = store
        .load_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    match loaded.as_slice() {
        [only] if only.dependencies.is_empty() => Ok(()),
        other => Err(format!("expected one replaced record, got {:?}", other)),
    }
}

fn load_is_sorted_by_id<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    for id in ["user_user_default_language", "file_file_default_language"] {
        store
            .save(&make_record(id, "content_staging"))
            .map_err(|e| e.to_string())?;
    }
    let ids: Vec<String> = store
        .load_namespace("content_staging")
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|r| r.id)
        .collect();
    if ids != ["file_file_default_language", "user_user_default_language"] {
        return Err(format!("unexpected order: {:?}", ids));
    }
    Ok(())
}

fn empty_store_loads_nothing<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let store = factory();
    let loaded = store
        .load_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if !loaded.is_empty() {
        return Err(format!("expected no records, got {}", loaded.len()));
    }
    Ok(())
}
