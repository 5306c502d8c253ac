// State persistence - patterns and settings saved between sessions

pub mod store;
pub mod types;

pub use store::{JsonFileStore, MemoryStore, PersistenceError, SnapshotStore};
pub use types::{SNAPSHOT_VERSION, StateSnapshot};
