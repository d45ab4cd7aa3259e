//! Change-list reconciliation.
//!
//! A [`Synchronizer`] owns the version record and the cancellation token of a
//! sync run. Each collection implements [`Syncable`] by binding
//! [`change_list_sync`] to its own version field, remote change list and
//! local DAO.
//!
//! One pass of [`change_list_sync`]:
//! 1. read the collection's version from the record
//! 2. fetch the change list after that version
//! 3. stop if it is empty
//! 4. split it into deleted and updated ids
//! 5. delete, then fetch and upsert
//! 6. advance the version to the last entry's version
//!
//! The version is written only after the deletes and upserts returned, so a
//! crash in between re-applies the pass on the next sync. This is safe
//! because deletes and upserts are idempotent.

use crate::network::NetworkError;
use async_trait::async_trait;
use std::future::Future;
use sync_core::{is_ascending, ChangeListPlan};
use sync_store::{StorageError, VersionUpdate};
use sync_types::{ChangeListEntry, ChangeListVersions, CollectionKind, Version};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The sync run was cancelled.
///
/// Never converted into a failed outcome: it always propagates to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sync cancelled")]
pub struct Cancelled;

/// Errors inside a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote call failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Local storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The run was cancelled.
    #[error("sync cancelled")]
    Cancelled,
}

impl From<Cancelled> for SyncError {
    fn from(_: Cancelled) -> Self {
        SyncError::Cancelled
    }
}

/// Context a collection syncs against.
///
/// Implementations guarantee that sync runs do not overlap, and serialize
/// version record updates.
#[async_trait]
pub trait Synchronizer: Send + Sync {
    /// Read the version record.
    async fn change_list_versions(&self) -> Result<ChangeListVersions, SyncError>;

    /// Atomically apply `update` to the version record.
    async fn update_change_list_versions(&self, update: VersionUpdate) -> Result<(), SyncError>;

    /// Token cancelled when the run must stop.
    fn cancellation(&self) -> &CancellationToken;
}

/// A collection that can be brought up to date with the remote.
#[async_trait]
pub trait Syncable: Send + Sync {
    /// Collection this syncable covers.
    fn kind(&self) -> CollectionKind;

    /// Run one reconciliation pass.
    ///
    /// Returns `Ok(true)` on success, `Ok(false)` on any ordinary failure
    /// (already logged), and `Err(Cancelled)` if the run was cancelled.
    async fn sync_with(&self, synchronizer: &dyn Synchronizer) -> Result<bool, Cancelled>;
}

/// Reconcile one collection with its remote change list.
///
/// - `version_reader` picks the collection's version out of the record
/// - `change_list_fetcher` lists remote changes after a version
/// - `version_updater` writes a new version into the record
/// - `model_deleter` removes ids from local storage
/// - `model_updater` fetches full entities for ids and upserts them
///
/// Ordinary errors are logged and reported as `Ok(false)`; nothing already
/// written is rolled back and the version is left unchanged. Cancellation,
/// from the synchronizer's token or from a callback, interrupts the pass and
/// returns `Err(Cancelled)`.
#[allow(clippy::too_many_arguments)]
pub async fn change_list_sync<
    Reader,
    Fetcher,
    FetchFut,
    Updater,
    Deleter,
    DeleteFut,
    Upserter,
    UpsertFut,
>(
    synchronizer: &dyn Synchronizer,
    kind: CollectionKind,
    version_reader: Reader,
    change_list_fetcher: Fetcher,
    version_updater: Updater,
    model_deleter: Deleter,
    model_updater: Upserter,
) -> Result<bool, Cancelled>
where
    Reader: FnOnce(&ChangeListVersions) -> Version,
    Fetcher: FnOnce(Version) -> FetchFut,
    FetchFut: Future<Output = Result<Vec<ChangeListEntry>, SyncError>>,
    Updater: FnOnce(ChangeListVersions, Version) -> ChangeListVersions + Send + 'static,
    Deleter: FnOnce(Vec<String>) -> DeleteFut,
    DeleteFut: Future<Output = Result<(), SyncError>>,
    Upserter: FnOnce(Vec<String>) -> UpsertFut,
    UpsertFut: Future<Output = Result<(), SyncError>>,
{
    let pass = async {
        let current = version_reader(&synchronizer.change_list_versions().await?);
        let entries = change_list_fetcher(current).await?;

        if !is_ascending(&entries) {
            tracing::warn!(%kind, "change list is not in ascending version order");
        }

        let Some(plan) = ChangeListPlan::from_entries(current, &entries) else {
            tracing::debug!(%kind, %current, "already up to date");
            return Ok(());
        };

        let ChangeListPlan {
            deleted_ids,
            updated_ids,
            latest_version,
        } = plan;
        tracing::debug!(
            %kind,
            deleted = deleted_ids.len(),
            updated = updated_ids.len(),
            "applying change list"
        );

        model_deleter(deleted_ids).await?;
        model_updater(updated_ids).await?;

        synchronizer
            .update_change_list_versions(Box::new(move |versions| {
                version_updater(versions, latest_version)
            }))
            .await?;

        tracing::debug!(%kind, from = %current, to = %latest_version, "version advanced");
        Ok::<(), SyncError>(())
    };

    let token = synchronizer.cancellation();
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => Err(SyncError::Cancelled),
        result = pass => result,
    };

    match result {
        Ok(()) => Ok(true),
        Err(SyncError::Cancelled) => {
            tracing::debug!(%kind, "sync cancelled");
            Err(Cancelled)
        }
        Err(error) => {
            tracing::warn!(%kind, %error, "sync failed");
            Ok(false)
        }
    }
}
