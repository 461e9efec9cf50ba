//! Save/load of the store's collections.
//!
//! The snapshot is a versionless JSON record. Every field defaults, so a
//! snapshot written by an older build (or a partial one) loads as far as
//! it goes and falls back to the initial state for the rest.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ignition_logic::model::{Artifact, AsteroidEvent, EthicalSettings, Habit, Quest, ReactorState};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),
}

/// Everything the store persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub habits: Vec<Habit>,
    pub artifacts: Vec<Artifact>,
    pub reactor: ReactorState,
    pub quests: Vec<Quest>,
    pub events: Vec<AsteroidEvent>,
    pub ethical_settings: EthicalSettings,
    /// Fragment progress toward the next assembled artifact, in [0, 1).
    pub artifact_progress: f64,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        serde_json::from_str(json).map_err(|e| PersistError::Corrupt(e.to_string()))
    }
}

/// Drop completion history older than `retention_days`. Streaks and
/// `last_completed` are left alone.
pub fn prune_history(habits: &mut [Habit], now: DateTime<Utc>, retention_days: i64) -> usize {
    let cutoff = now - Duration::days(retention_days);
    let mut removed = 0;
    for habit in habits.iter_mut() {
        let before = habit.completion_history.len();
        habit.completion_history.retain(|ts| *ts >= cutoff);
        removed += before - habit.completion_history.len();
    }
    removed
}

/// Durable home for the serialized snapshot.
pub trait SnapshotStorage: Send {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<String>, PersistError>;
    fn save(&mut self, data: &str) -> Result<(), PersistError>;
}

/// Snapshot stored as a JSON file. Writes go to a sibling temp file that
/// is then renamed over the target, so a crash never leaves half a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, data: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.temp_path();
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    data: Option<String>,
    fail_writes: bool,
    fail_reads: bool,
    writes: usize,
}

/// In-memory storage. Clones share the same buffer, so a test can keep a
/// handle after moving one into the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.lock().data = Some(data.into());
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned buffer is still a valid string.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn data(&self) -> Option<String> {
        self.lock().data.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }
}

impl SnapshotStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, PersistError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "read refused").into());
        }
        Ok(inner.data.clone())
    }

    fn save(&mut self, data: &str) -> Result<(), PersistError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "write refused").into());
        }
        inner.data = Some(data.to_string());
        inner.writes += 1;
        Ok(())
    }
}
