//! Core Ignition - habit reactor state store
//!
//! Turns habit completions into reactor energy. The store owns every
//! collection (habits, artifacts, quests, events, settings) and applies
//! actions through the pure rules in `ignition_logic`.
//!
//! # Architecture
//!
//! - **Store** ([`store::CoreStore`]): serialized mutation path. User
//!   actions and the periodic decay tick go through the same `&mut self`.
//! - **Scheduler** ([`scheduler::DecayScheduler`]): owned by the store,
//!   polled with explicit time.
//! - **Persistence** ([`persistence`]): JSON snapshot behind a storage trait.
//! - **Sync** ([`sync`]): async, debounced reconciliation with a remote store.
//! - **Notifications/signals** ([`notifications`]): what presentation reads.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use ignition_core::prelude::*;
//!
//! let mut store = CoreStore::open(
//!     EngineConfig::default(),
//!     FileStorage::new("core-ignition.json"),
//!     Utc::now(),
//! );
//! store.start_ticker(Utc::now());
//!
//! loop {
//!     store.update(Utc::now());
//!     for signal in store.take_signals() {
//!         println!("{:?}", signal);
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! ```

pub mod config;
pub mod notifications;
pub mod persistence;
pub mod scheduler;
pub mod store;
pub mod sync;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::notifications::{Notification, NotificationKind, Signal};
    pub use crate::persistence::{FileStorage, MemoryStorage, Snapshot, SnapshotStorage};
    pub use crate::store::{CompletionReport, CoreStore, TickReport};
    pub use crate::sync::{MemoryRemote, RemoteStore, SyncManager, SyncPayload};
    pub use ignition_logic::model::*;
}
