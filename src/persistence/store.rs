// Snapshot stores - where the machine's state lives between sessions

use crate::persistence::types::StateSnapshot;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const APP_DIR: &str = "dr16";
const STATE_FILE: &str = "state.json";

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("No per-user data directory on this platform")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere a snapshot can be read from and written to
pub trait SnapshotStore: Send + Sync {
    /// Last saved snapshot; None when absent or unreadable
    fn load_snapshot(&self) -> Option<StateSnapshot>;

    fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError>;
}

/// Pretty-printed JSON file
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/dr16/state.json`
    pub fn default_location() -> Result<Self, PersistenceError> {
        let dir = dirs::data_dir().ok_or(PersistenceError::NoDataDir)?;
        Ok(Self::new(dir.join(APP_DIR).join(STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StateSnapshot, PersistenceError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load_snapshot(&self) -> Option<StateSnapshot> {
        if !self.path.exists() {
            log::debug!("No saved state at {}", self.path.display());
            return None;
        }
        match self.read() {
            Ok(snapshot) => {
                log::info!("Loaded state from {}", self.path.display());
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("Ignoring unreadable state {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store for tests and machines without a data directory
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<StateSnapshot>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl SnapshotStore for MemoryStore {
    fn load_snapshot(&self) -> Option<StateSnapshot> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }

    fn save_snapshot(&self, snapshot: &StateSnapshot) -> Result<(), PersistenceError> {
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(snapshot.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
