// Application configuration - state location, scheduler timing, queue sizes

use crate::persistence::{JsonFileStore, MemoryStore, SnapshotStore};
use crate::sequencer::scheduler::SchedulerConfig;
use std::path::PathBuf;

// Ringbuffer capacity constants
// The scheduler commits at most one bar ahead (16 steps x 9 instruments at
// worst), and the callback drains the queue every buffer.
pub const SCHEDULED_RINGBUFFER_CAPACITY: usize = 256;
pub const PREVIEW_RINGBUFFER_CAPACITY: usize = 64;
pub const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;

/// Environment variable overriding the state file
pub const STATE_PATH_ENV: &str = "DR16_STATE";

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Explicit state file; None means the platform data directory
    pub state_path: Option<PathBuf>,
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// First command line argument, then `DR16_STATE`
    pub fn from_env() -> Self {
        Self::from_sources(std::env::args().nth(1), std::env::var(STATE_PATH_ENV).ok())
    }

    pub fn from_sources(arg: Option<String>, env: Option<String>) -> Self {
        let state_path = arg
            .or(env)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            state_path,
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Store for the configured location
    ///
    /// Falls back to memory (nothing survives a restart) when the platform
    /// has no data directory.
    pub fn snapshot_store(&self) -> Box<dyn SnapshotStore> {
        if let Some(path) = &self.state_path {
            return Box::new(JsonFileStore::new(path));
        }
        match JsonFileStore::default_location() {
            Ok(store) => {
                log::info!("State file: {}", store.path().display());
                Box::new(store)
            }
            Err(e) => {
                log::warn!("{}, state will not be saved", e);
                Box::new(MemoryStore::new())
            }
        }
    }
}
