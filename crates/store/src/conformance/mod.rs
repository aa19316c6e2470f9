//! Conformance test suite for `PlanStore` implementations.
//!
//! Backend-agnostic checks that any store must pass:
//!
//! - **Save**: records round-trip, saving the same id replaces it
//! - **Discard**: only the requested namespace is removed, counts are exact
//!
//! # Usage
//!
//! ```ignore
//! use staging_store::conformance::run_conformance_suite;
//!
//! #[test]
//! fn my_store_conformance() {
//!     let report = run_conformance_suite(|| MyStore::fresh());
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod discard;
mod save;

use std::collections::BTreeMap;
use std::fmt;

use crate::record::{DestinationRecord, PlanRecord, SourceRecord};
use crate::PlanStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category ("save" or "discard").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: result.is_ok(),
            message: result.err(),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a plan store.
///
/// The `factory` is called once per test and must return a fresh, empty store.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: PlanStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(save::run_save_tests(&factory));
    results.extend(discard::run_discard_tests(&factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

fn make_record(id: &str, group: &str) -> PlanRecord {
    PlanRecord {
        id: id.to_string(),
        label: format!("Import {}", id),
        group: group.to_string(),
        tags: vec![group.to_string()],
        source: SourceRecord {
            plugin: "staging_json".to_string(),
            input_path: format!("node/default_language/{}.json", id),
            ids: BTreeMap::from([("uuid".to_string(), "string".to_string())]),
        },
        process: serde_json::json!({ "title": { "plugin": "get", "source": "title" } }),
        destination: DestinationRecord {
            plugin: "entity:node".to_string(),
            translations: false,
        },
        dependencies: vec!["user_user_default_language".to_string()],
    }
}
