pub mod conformance;
mod directory;
mod error;
mod memory;
mod record;
mod traits;

pub use directory::DirectoryPlanStore;
pub use error::StoreError;
pub use memory::MemoryPlanStore;
pub use record::{DestinationRecord, PlanRecord, SourceRecord};
pub use traits::PlanStore;
