use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A compiled migration unit as handed to the plan-execution runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    /// `{entity_type}_{bundle}_{default_language|translations}`.
    pub id: String,
    pub label: String,
    /// Plan namespace this record belongs to; discarded as a whole on rebuild.
    pub group: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: SourceRecord,
    /// Destination property -> transform step(s).
    pub process: serde_json::Value,
    pub destination: DestinationRecord,
    /// Unit ids that must exist/execute before this one. Never contains `id`.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Where the runtime reads rows from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub plugin: String,
    /// Snapshot file path: the staging root the plan was compiled against,
    /// joined with `<entityType>/<variant>/<bundle>.json`.
    pub input_path: String,
    /// Row identifier column -> type.
    pub ids: BTreeMap<String, String>,
}

/// Where the runtime writes entities to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub plugin: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub translations: bool,
}
