//! The sync worker: one attempt at bringing every collection up to date.

use crate::synchronizer::{Cancelled, SyncError, Syncable, Synchronizer};
use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use sync_store::{SearchIndex, VersionStore, VersionUpdate};
use sync_types::ChangeListVersions;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Result of one unit of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkResult {
    /// Work completed; nothing to retry.
    Success,
    /// Work failed; the scheduler should retry with backoff.
    Retry,
}

/// A unit of background work.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Perform the work once.
    ///
    /// Ordinary failures are reported as [`WorkResult::Retry`]; only
    /// cancellation is an error.
    async fn do_work(&self) -> Result<WorkResult, Cancelled>;
}

/// Subscribes the device to change notifications from the remote.
///
/// Called at the start of every sync run so a push message can trigger the
/// next one.
#[async_trait]
pub trait SyncSubscriber: Send + Sync {
    /// Ensure the subscription exists.
    async fn subscribe(&self) -> Result<(), SyncError>;
}

/// Subscriber for builds without push notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSyncSubscriber;

#[async_trait]
impl SyncSubscriber for NoopSyncSubscriber {
    async fn subscribe(&self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Syncs every collection in parallel, then rebuilds the search index.
pub struct SyncWorker {
    versions: Arc<dyn VersionStore>,
    syncables: Vec<Arc<dyn Syncable>>,
    search_index: Arc<dyn SearchIndex>,
    subscriber: Arc<dyn SyncSubscriber>,
    version_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl SyncWorker {
    /// Create a worker.
    pub fn new(
        versions: Arc<dyn VersionStore>,
        syncables: Vec<Arc<dyn Syncable>>,
        search_index: Arc<dyn SearchIndex>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            versions,
            syncables,
            search_index,
            subscriber: Arc::new(NoopSyncSubscriber),
            version_lock: Mutex::new(()),
            cancel,
        }
    }

    /// Use `subscriber` for change notifications.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn SyncSubscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }

    async fn subscribe(&self) -> Result<(), Cancelled> {
        let subscribed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Cancelled),
            result = self.subscriber.subscribe() => result,
        };
        match subscribed {
            Ok(()) => Ok(()),
            Err(SyncError::Cancelled) => Err(Cancelled),
            // Notifications only speed up the next sync; this one still runs
            Err(error) => {
                tracing::warn!(%error, "change notification subscription failed");
                Ok(())
            }
        }
    }

    async fn rebuild_search_index(&self) -> bool {
        let rebuild = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return false,
            result = self.search_index.rebuild() => result,
        };
        match rebuild {
            Ok(indexed) => {
                tracing::debug!(indexed, "search index rebuilt");
                true
            }
            Err(error) => {
                tracing::warn!(%error, "search index rebuild failed");
                false
            }
        }
    }
}

#[async_trait]
impl Synchronizer for SyncWorker {
    async fn change_list_versions(&self) -> Result<ChangeListVersions, SyncError> {
        Ok(self.versions.change_list_versions().await?)
    }

    async fn update_change_list_versions(&self, update: VersionUpdate) -> Result<(), SyncError> {
        // Collections sync in parallel but share one record
        let _guard = self.version_lock.lock().await;
        self.versions.update_change_list_versions(update).await?;
        Ok(())
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[async_trait]
impl Worker for SyncWorker {
    #[tracing::instrument(name = "sync", skip_all)]
    async fn do_work(&self) -> Result<WorkResult, Cancelled> {
        tracing::info!(collections = self.syncables.len(), "sync started");
        self.subscribe().await?;

        let outcomes = join_all(
            self.syncables
                .iter()
                .map(|syncable| syncable.sync_with(self)),
        )
        .await;

        let mut all_synced = true;
        for (syncable, outcome) in self.syncables.iter().zip(outcomes) {
            let synced = outcome?;
            if !synced {
                tracing::debug!(kind = %syncable.kind(), "collection did not sync");
            }
            all_synced &= synced;
        }
        tracing::info!(succeeded = all_synced, "sync finished");

        if !all_synced {
            return Ok(WorkResult::Retry);
        }

        // Already applied changes stay applied if the rebuild fails
        let indexed = self.rebuild_search_index().await;
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }

        Ok(if indexed {
            WorkResult::Success
        } else {
            WorkResult::Retry
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockChangeListClient;
    use crate::repository::fixtures::{news, topic};
    use crate::repository::{OfflineFirstNewsRepository, OfflineFirstTopicsRepository};
    use std::time::Duration;
    use sync_store::{MemoryStore, NewsResourceDao, StoreWrite, TopicDao};
    use sync_types::{ChangeListEntry, CollectionKind, Version};

    fn worker(network: &MockChangeListClient, store: &MemoryStore) -> SyncWorker {
        let client: Arc<MockChangeListClient> = Arc::new(network.clone());
        let store = Arc::new(store.clone());
        let syncables: Vec<Arc<dyn Syncable>> = vec![
            Arc::new(OfflineFirstTopicsRepository::new(client.clone(), store.clone())),
            Arc::new(OfflineFirstNewsRepository::new(client, store.clone())),
        ];
        SyncWorker::new(store.clone(), syncables, store, CancellationToken::new())
    }

    fn populated_network() -> MockChangeListClient {
        let network = MockChangeListClient::new();
        network.set_change_list(CollectionKind::Topics, vec![ChangeListEntry::updated("t1", 1)]);
        network.set_change_list(
            CollectionKind::NewsResources,
            vec![ChangeListEntry::updated("n1", 2)],
        );
        network.add_topic(topic("t1"));
        network.add_news_resource(news("n1", &["t1"]));
        network
    }

    #[tokio::test]
    async fn full_success_rebuilds_index() {
        let network = populated_network();
        let store = MemoryStore::new();

        assert_eq!(worker(&network, &store).do_work().await, Ok(WorkResult::Success));

        let versions = store.change_list_versions().await.unwrap();
        assert_eq!(versions.topic_version, Version::new(1));
        assert_eq!(versions.news_resource_version, Version::new(2));
        assert_eq!(store.writes().last(), Some(&StoreWrite::RebuildIndex));
        assert_eq!(store.search("news").await.unwrap().news_resource_ids, vec!["n1"]);
    }

    #[tokio::test]
    async fn one_failure_skips_rebuild_but_keeps_other_writes() {
        let network = populated_network();
        network.fail_next_change_list(CollectionKind::NewsResources, "offline");
        let store = MemoryStore::new();

        assert_eq!(worker(&network, &store).do_work().await, Ok(WorkResult::Retry));

        assert!(!store.writes().contains(&StoreWrite::RebuildIndex));
        assert_eq!(store.topic_count().await.unwrap(), 1);
        assert_eq!(store.news_resource_count().await.unwrap(), 0);
        let versions = store.change_list_versions().await.unwrap();
        assert_eq!(versions.topic_version, Version::new(1));
        assert!(!versions.news_resource_version.is_synced());
    }

    #[tokio::test]
    async fn failure_does_not_short_circuit_other_collections() {
        let network = populated_network();
        network.fail_next_change_list(CollectionKind::Topics, "offline");
        let store = MemoryStore::new();

        assert_eq!(worker(&network, &store).do_work().await, Ok(WorkResult::Retry));

        // News still synced although topics failed
        assert_eq!(store.news_resource_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rebuild_failure_requests_retry_without_rollback() {
        let network = populated_network();
        let store = MemoryStore::new();
        store.fail_next_rebuild("index corrupted");

        assert_eq!(worker(&network, &store).do_work().await, Ok(WorkResult::Retry));

        assert_eq!(store.topic_count().await.unwrap(), 1);
        assert_eq!(store.news_resource_count().await.unwrap(), 1);
        assert_eq!(
            store.change_list_versions().await.unwrap().news_resource_version,
            Version::new(2)
        );
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let network = populated_network();
        let store = MemoryStore::new();

        worker(&network, &store).do_work().await.unwrap();
        store.clear_writes();
        assert_eq!(worker(&network, &store).do_work().await, Ok(WorkResult::Success));

        // Only the index rebuild, no entity or version writes
        assert_eq!(store.writes(), vec![StoreWrite::RebuildIndex]);
    }

    /// Counts subscriptions, failing the first `failures` of them.
    #[derive(Default)]
    struct CountingSubscriber {
        calls: std::sync::atomic::AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl SyncSubscriber for CountingSubscriber {
        async fn subscribe(&self) -> Result<(), SyncError> {
            let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call < self.failures {
                return Err(SyncError::Network(crate::network::NetworkError::Timeout));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn subscribes_on_every_run() {
        let network = populated_network();
        let store = MemoryStore::new();
        let subscriber = Arc::new(CountingSubscriber::default());

        for _ in 0..2 {
            let worker = worker(&network, &store).with_subscriber(subscriber.clone());
            assert_eq!(worker.do_work().await, Ok(WorkResult::Success));
        }
        assert_eq!(subscriber.calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn subscription_failure_does_not_fail_sync() {
        let network = populated_network();
        let store = MemoryStore::new();
        let subscriber = Arc::new(CountingSubscriber {
            failures: 1,
            ..CountingSubscriber::default()
        });

        let worker = worker(&network, &store).with_subscriber(subscriber);
        assert_eq!(worker.do_work().await, Ok(WorkResult::Success));
        assert_eq!(store.topic_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cancellation_propagates() {
        let network = populated_network();
        network.hold();
        let store = MemoryStore::new();
        let worker = worker(&network, &store);
        let token = worker.cancel.clone();

        let cancel = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        assert_eq!(worker.do_work().await, Err(Cancelled));
        cancel.await.unwrap();
        assert!(store.writes().is_empty());
    }
}
