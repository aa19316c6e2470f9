use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::record::PlanRecord;
use crate::traits::PlanStore;

/// In-memory plan store, keyed by record id.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlanStore {
    records: BTreeMap<String, PlanRecord>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&PlanRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PlanStore for MemoryPlanStore {
    fn discard_namespace(&mut self, namespace: &str) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, r| r.group != namespace);
        Ok(before - self.records.len())
    }

    fn save(&mut self, record: &PlanRecord) -> Result<(), StoreError> {
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn load_namespace(&self, namespace: &str) -> Result<Vec<PlanRecord>, StoreError> {
        Ok(self
            .records
            .values()
            .filter(|r| r.group == namespace)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[test]
    fn memory_store_conformance() {
        let report = run_conformance_suite(MemoryPlanStore::new);
        assert!(report.failed == 0, "{report}");
    }
}
