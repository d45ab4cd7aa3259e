//! # sync-client
//!
//! Offline-first sync engine for feedsync.
//!
//! Local storage is the source of truth for reads; this crate keeps it up to
//! date with the remote service using versioned change lists.
//!
//! ## Features
//!
//! - **Incremental sync**: only entities changed after the stored version are fetched
//! - **Parallel collections**: topics and news resources sync concurrently
//! - **Unique work**: at most one run at a time, further triggers coalesce into it
//! - **Retry with backoff**: failed runs retry with exponential backoff and jitter
//! - **Structured cancellation**: shutdown interrupts in-flight calls, never reported as failure
//! - **Pure state machine**: scheduling decisions come from sync-core
//!
//! ## Example
//!
//! ```ignore
//! use sync_client::{HttpChangeListClient, SyncConfig, SyncManager, WorkerContext};
//! use sync_store::SqliteStore;
//!
//! let network = HttpChangeListClient::new("https://example.com/api", timeout)?;
//! let store = SqliteStore::open(&path).await?;
//! let config = SyncConfig::default();
//!
//! let manager = SyncManager::new(WorkerContext::new(Arc::new(network), store), config.retry_policy());
//! let mut status = manager.is_syncing();
//!
//! manager.initialize();
//! while let Some(syncing) = status.changed().await {
//!     println!("syncing: {syncing}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod manager;
pub mod network;
pub mod registry;
pub mod repository;
pub mod synchronizer;
pub mod worker;

pub use config::SyncConfig;
pub use manager::{spawn_periodic_sync, SyncManager, SyncRequest, SyncStatus};
pub use network::{
    ChangeListClient, DemoChangeListClient, HttpChangeListClient, MockChangeListClient,
    NetworkCall, NetworkError,
};
pub use registry::{create_worker, RegistryError, TaskKind, WorkerContext, WorkerFactory};
pub use repository::{OfflineFirstNewsRepository, OfflineFirstTopicsRepository};
pub use synchronizer::{change_list_sync, Cancelled, SyncError, Syncable, Synchronizer};
pub use worker::{NoopSyncSubscriber, SyncSubscriber, SyncWorker, WorkResult, Worker};

// Scheduling types callers match on
pub use sync_core::{RetryPolicy, WorkOutcome, WorkerState};
