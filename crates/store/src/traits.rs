use crate::error::StoreError;
use crate::record::PlanRecord;

/// Persistent home of compiled plan records.
///
/// Plan compilation is a full rebuild: the planner first calls
/// [`discard_namespace`](PlanStore::discard_namespace) for its namespace and
/// then [`save`](PlanStore::save)s every freshly compiled record. Records of
/// other namespaces must be left untouched.
///
/// ## Concurrency
///
/// Implementations are not required to guard against concurrent writers.
/// Callers serialize plan compilations externally.
pub trait PlanStore {
    /// Delete every record whose `group` equals `namespace`.
    ///
    /// Returns the number of records removed.
    fn discard_namespace(&mut self, namespace: &str) -> Result<usize, StoreError>;

    /// Insert or replace the record with `record.id`.
    fn save(&mut self, record: &PlanRecord) -> Result<(), StoreError>;

    /// All records of a namespace, sorted by id.
    fn load_namespace(&self, namespace: &str) -> Result<Vec<PlanRecord>, StoreError>;
}
