pub mod backend;
pub mod feedback;
pub mod store;

pub use backend::{JsonFileBackend, LoadError, MemoryBackend, PersistError, RuleBackend};
pub use feedback::record_correction;
pub use store::{RuleStore, RuleStoreError};
