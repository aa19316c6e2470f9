use super::{make_record, TestResult};
use crate::PlanStore;

pub(super) fn run_discard_tests<S, F>(factory: &F) -> Vec<TestResult>
where
    S: PlanStore,
    F: Fn() -> S,
{
    vec![
        TestResult::from_result(
            "discard",
            "discard_removes_whole_namespace",
            discard_removes_whole_namespace(factory),
        ),
        TestResult::from_result(
            "discard",
            "discard_keeps_other_namespaces",
            discard_keeps_other_namespaces(factory),
        ),
        TestResult::from_result(
            "discard",
            "discard_on_empty_store_is_zero",
            discard_on_empty_store_is_zero(factory),
        ),
    ]
}

fn discard_removes_whole_namespace<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    for id in ["a_a_default_language", "b_b_default_language", "b_b_translations"] {
        store
            .save(&make_record(id, "content_staging"))
            .map_err(|e| e.to_string())?;
    }
    let removed = store
        .discard_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if removed != 3 {
        return Err(format!("expected 3 removed, got {}", removed));
    }
    let left = store
        .load_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if !left.is_empty() {
        return Err(format!("{} records survived discard", left.len()));
    }
    Ok(())
}

fn discard_keeps_other_namespaces<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    store
        .save(&make_record("a_a_default_language", "content_staging"))
        .map_err(|e| e.to_string())?;
    store
        .save(&make_record("legacy_import", "legacy"))
        .map_err(|e| e.to_string())?;

    let removed = store
        .discard_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if removed != 1 {
        return Err(format!("expected 1 removed, got {}", removed));
    }
    let legacy = store.load_namespace("legacy").map_err(|e| e.to_string())?;
    if legacy.len() != 1 {
        return Err("record of another namespace was discarded".to_string());
    }
    Ok(())
}

fn discard_on_empty_store_is_zero<S: PlanStore, F: Fn() -> S>(factory: &F) -> Result<(), String> {
    let mut store = factory();
    let removed = store
        .discard_namespace("content_staging")
        .map_err(|e| e.to_string())?;
    if removed != 0 {
        return Err(format!("expected 0 removed, got {}", removed));
    }
    Ok(())
}
