//! Remote synchronization.
//!
//! The remote keeps one record per user: serialized habits, serialized
//! artifacts and an update timestamp. A sync pulls that record, merges its
//! habits into the local ones, and pushes the merged habits together with
//! the local artifacts (artifacts are overwritten, never merged).
//!
//! Outbound requests are debounced: a new request replaces one that is
//! still waiting, and a mutex keeps at most one sync in flight. Failures
//! only touch [`SyncState`]; local game state is never rolled back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use ignition_logic::merge::merge_habits;
use ignition_logic::model::{Artifact, Habit, SyncState, SyncStatus};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote store failed: {0}")]
    Remote(String),
    #[error("remote habits could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("local state could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("sync is offline")]
    Offline,
}

/// The single per-user row kept by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub user_id: String,
    /// JSON array of habits.
    pub habits: String,
    /// JSON array of artifacts.
    pub artifacts: String,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `Ok(None)` when the user has no record yet.
    async fn fetch(&self, user_id: &str) -> Result<Option<RemoteRecord>, SyncError>;
    async fn upsert(&self, record: RemoteRecord) -> Result<(), SyncError>;
}

/// In-process remote with failure injection, used by tests and the harness.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    records: Mutex<HashMap<String, RemoteRecord>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    upserts: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn insert(&self, record: RemoteRecord) {
        self.lock().insert(record.user_id.clone(), record);
    }

    pub fn record(&self, user_id: &str) -> Option<RemoteRecord> {
        self.lock().get(user_id).cloned()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RemoteRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SyncError::Remote("remote unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch(&self, user_id: &str) -> Result<Option<RemoteRecord>, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.record(user_id))
    }

    async fn upsert(&self, record: RemoteRecord) -> Result<(), SyncError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.insert(record);
        Ok(())
    }
}

/// Local data handed to a sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPayload {
    pub habits: Vec<Habit>,
    pub artifacts: Vec<Artifact>,
}

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Local habits merged with the remote ones; what was pushed.
    pub merged_habits: Vec<Habit>,
    pub remote_found: bool,
}

pub type SyncOutcome = Result<SyncReport, SyncError>;

struct SyncShared {
    remote: Arc<dyn RemoteStore>,
    user_id: String,
    state: watch::Sender<SyncState>,
    outcomes: mpsc::UnboundedSender<SyncOutcome>,
    in_flight: tokio::sync::Mutex<()>,
}

impl SyncShared {
    fn update_state(&self, f: impl FnOnce(&mut SyncState)) {
        self.state.send_modify(f);
    }

    async fn sync_once(&self, payload: SyncPayload) -> SyncOutcome {
        if self.state.borrow().status == SyncStatus::Offline {
            return Err(SyncError::Offline);
        }
        let _guard = self.in_flight.lock().await;
        self.update_state(|s| s.status = SyncStatus::Syncing);
        log::debug!("sync: starting for {}", self.user_id);

        match self.run(payload).await {
            Ok(report) => {
                self.update_state(|s| {
                    s.status = SyncStatus::Synced;
                    s.last_synced_at = Some(Utc::now());
                    s.error_message = None;
                });
                log::info!(
                    "sync: pushed {} habits (remote record found: {})",
                    report.merged_habits.len(),
                    report.remote_found
                );
                Ok(report)
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("sync: failed: {}", message);
                self.update_state(|s| {
                    s.status = SyncStatus::Error;
                    s.error_message = Some(message);
                });
                Err(e)
            }
        }
    }

    async fn run(&self, payload: SyncPayload) -> SyncOutcome {
        let existing = self.remote.fetch(&self.user_id).await?;
        let remote_found = existing.is_some();
        let remote_habits: Vec<Habit> = match existing {
            Some(record) => serde_json::from_str(&record.habits).map_err(SyncError::Decode)?,
            None => Vec::new(),
        };

        let merged_habits = merge_habits(&payload.habits, &remote_habits);
        let record = RemoteRecord {
            user_id: self.user_id.clone(),
            habits: serde_json::to_string(&merged_habits).map_err(SyncError::Encode)?,
            artifacts: serde_json::to_string(&payload.artifacts).map_err(SyncError::Encode)?,
            updated_at: Utc::now(),
        };
        self.remote.upsert(record).await?;

        Ok(SyncReport {
            merged_habits,
            remote_found,
        })
    }
}

struct PendingSync {
    handle: JoinHandle<()>,
    started: Arc<AtomicBool>,
}

/// Debounced sync collaborator. Must be used from inside a tokio runtime.
pub struct SyncManager {
    shared: Arc<SyncShared>,
    debounce: Duration,
    pending: Mutex<Option<PendingSync>>,
}

impl SyncManager {
    /// Returns the manager and the channel on which outcomes of debounced
    /// requests are delivered.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        user_id: impl Into<String>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SyncOutcome>) {
        let (state, _) = watch::channel(SyncState::default());
        let (outcomes, rx) = mpsc::unbounded_channel();
        let manager = Self {
            shared: Arc::new(SyncShared {
                remote,
                user_id: user_id.into(),
                state,
                outcomes,
                in_flight: tokio::sync::Mutex::new(()),
            }),
            debounce,
            pending: Mutex::new(None),
        };
        (manager, rx)
    }

    pub fn state(&self) -> SyncState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.shared.state.subscribe()
    }

    /// Run a sync now, bypassing the debounce.
    pub async fn sync_once(&self, payload: SyncPayload) -> SyncOutcome {
        self.shared.sync_once(payload).await
    }

    /// Schedule a sync after the debounce window, superseding a request
    /// that has not started yet. A sync already running is left to finish.
    pub fn request(&self, payload: SyncPayload) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            if !previous.started.load(Ordering::SeqCst) {
                previous.handle.abort();
                log::debug!("sync: superseded pending request");
            }
        }

        let shared = Arc::clone(&self.shared);
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            flag.store(true, Ordering::SeqCst);
            let outcome = shared.sync_once(payload).await;
            // Nobody listening is fine.
            let _ = shared.outcomes.send(outcome);
        });
        *pending = Some(PendingSync { handle, started });
    }

    /// True while a debounced request is waiting or running.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map_or(false, |p| !p.handle.is_finished())
    }

    pub fn set_offline(&self) {
        self.shared.update_state(|s| s.status = SyncStatus::Offline);
    }

    pub fn set_online(&self) {
        self.shared.update_state(|s| {
            if s.status == SyncStatus::Offline {
                s.status = SyncStatus::Idle;
            }
        });
    }
}
