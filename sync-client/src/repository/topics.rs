use crate::network::ChangeListClient;
use crate::synchronizer::{change_list_sync, Cancelled, SyncError, Syncable, Synchronizer};
use async_trait::async_trait;
use std::sync::Arc;
use sync_store::{StorageError, TopicDao};
use sync_types::{ChangeListEntry, ChangeListVersions, CollectionKind, Topic, Version};

/// Topics, read locally and synced from the remote topics change list.
#[derive(Clone)]
pub struct OfflineFirstTopicsRepository {
    network: Arc<dyn ChangeListClient>,
    dao: Arc<dyn TopicDao>,
}

impl OfflineFirstTopicsRepository {
    /// Create a repository over a remote client and local topic storage.
    pub fn new(network: Arc<dyn ChangeListClient>, dao: Arc<dyn TopicDao>) -> Self {
        Self { network, dao }
    }

    /// All locally stored topics.
    pub async fn topics(&self) -> Result<Vec<Topic>, StorageError> {
        self.dao.topics().await
    }

    /// A locally stored topic.
    pub async fn topic(&self, id: &str) -> Result<Option<Topic>, StorageError> {
        self.dao.topic(id).await
    }

    async fn fetch_change_list(&self, after: Version) -> Result<Vec<ChangeListEntry>, SyncError> {
        Ok(self
            .network
            .get_change_list(CollectionKind::Topics, Some(after))
            .await?)
    }

    async fn delete(&self, ids: Vec<String>) -> Result<(), SyncError> {
        if !ids.is_empty() {
            self.dao.delete_topics(ids).await?;
        }
        Ok(())
    }

    async fn fetch_and_upsert(&self, ids: Vec<String>) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }
        let topics = self.network.get_topics(&ids).await?;
        self.dao.upsert_topics(topics).await?;
        Ok(())
    }
}

fn topic_version(versions: &ChangeListVersions) -> Version {
    versions.topic_version
}

fn with_topic_version(versions: ChangeListVersions, version: Version) -> ChangeListVersions {
    versions.with(CollectionKind::Topics, version)
}

#[async_trait]
impl Syncable for OfflineFirstTopicsRepository {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Topics
    }

    async fn sync_with(&self, synchronizer: &dyn Synchronizer) -> Result<bool, Cancelled> {
        change_list_sync(
            synchronizer,
            CollectionKind::Topics,
            topic_version,
            |after| self.fetch_change_list(after),
            with_topic_version,
            |ids| self.delete(ids),
            |ids| self.fetch_and_upsert(ids),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{MockChangeListClient, NetworkCall};
    use crate::repository::fixtures::topic;
    use crate::synchronizer::tests::TestSynchronizer;
    use sync_store::{MemoryStore, StoreWrite, VersionStore};

    fn setup(version: i64) -> (MockChangeListClient, MemoryStore, OfflineFirstTopicsRepository) {
        let network = MockChangeListClient::new();
        let store = MemoryStore::with_versions(
            ChangeListVersions::new().with(CollectionKind::Topics, Version::new(version)),
        );
        let repository =
            OfflineFirstTopicsRepository::new(Arc::new(network.clone()), Arc::new(store.clone()));
        (network, store, repository)
    }

    #[tokio::test]
    async fn scenario_delete_and_update_from_version_five() {
        let (network, store, repository) = setup(5);
        network.set_change_list(
            CollectionKind::Topics,
            vec![
                ChangeListEntry::updated("t9", 6),
                ChangeListEntry::deleted("t2", 7),
            ],
        );
        network.add_topic(topic("t9"));
        store.upsert_topics(vec![topic("t2")]).await.unwrap();
        store.clear_writes();

        let sync = TestSynchronizer::new(store.clone());
        assert_eq!(repository.sync_with(&sync).await, Ok(true));

        assert_eq!(
            store.writes(),
            vec![
                StoreWrite::Delete(CollectionKind::Topics, vec!["t2".into()]),
                StoreWrite::Upsert(CollectionKind::Topics, vec!["t9".into()]),
                StoreWrite::Versions(
                    ChangeListVersions::new().with(CollectionKind::Topics, Version::new(7))
                ),
            ]
        );
        assert_eq!(
            network.calls(),
            vec![
                NetworkCall::ChangeList(CollectionKind::Topics, Some(Version::new(5))),
                NetworkCall::Entities(CollectionKind::Topics, vec!["t9".into()]),
            ]
        );
        let ids: Vec<String> = repository.topics().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t9"]);
    }

    #[tokio::test]
    async fn rerun_with_nothing_new_writes_nothing() {
        let (network, store, repository) = setup(-1);
        network.set_change_list(CollectionKind::Topics, vec![ChangeListEntry::updated("t1", 0)]);
        network.add_topic(topic("t1"));
        let sync = TestSynchronizer::new(store.clone());

        assert_eq!(repository.sync_with(&sync).await, Ok(true));
        store.clear_writes();

        assert_eq!(repository.sync_with(&sync).await, Ok(true));
        assert!(store.writes().is_empty());
        assert_eq!(
            network.calls().last(),
            Some(&NetworkCall::ChangeList(CollectionKind::Topics, Some(Version::new(0))))
        );
    }

    #[tokio::test]
    async fn watermark_is_max_of_sorted_list() {
        let (network, store, repository) = setup(-1);
        network.set_change_list(
            CollectionKind::Topics,
            vec![
                ChangeListEntry::updated("a", 2),
                ChangeListEntry::updated("b", 4),
                ChangeListEntry::deleted("c", 4),
                ChangeListEntry::updated("d", 11),
            ],
        );
        let sync = TestSynchronizer::new(store.clone());

        assert_eq!(repository.sync_with(&sync).await, Ok(true));
        assert_eq!(
            store.change_list_versions().await.unwrap().topic_version,
            Version::new(11)
        );
    }

    #[tokio::test]
    async fn network_failure_leaves_store_untouched() {
        let (network, store, repository) = setup(5);
        network.set_change_list(CollectionKind::Topics, vec![ChangeListEntry::deleted("t1", 6)]);
        network.fail_next_change_list(CollectionKind::Topics, "offline");
        let sync = TestSynchronizer::new(store.clone());

        assert_eq!(repository.sync_with(&sync).await, Ok(false));
        assert!(store.writes().is_empty());
        assert_eq!(
            store.change_list_versions().await.unwrap().topic_version,
            Version::new(5)
        );
    }

    #[tokio::test]
    async fn entity_fetch_failure_keeps_version() {
        let (network, store, repository) = setup(5);
        network.set_change_list(CollectionKind::Topics, vec![ChangeListEntry::updated("t1", 6)]);
        network.fail_next_entities(CollectionKind::Topics, "timeout");
        let sync = TestSynchronizer::new(store.clone());

        assert_eq!(repository.sync_with(&sync).await, Ok(false));
        assert_eq!(
            store.change_list_versions().await.unwrap().topic_version,
            Version::new(5)
        );
    }

    #[tokio::test]
    async fn only_deletes_skip_entity_fetch() {
        let (network, store, repository) = setup(0);
        network.set_change_list(CollectionKind::Topics, vec![ChangeListEntry::deleted("t1", 1)]);
        let sync = TestSynchronizer::new(store.clone());

        assert_eq!(repository.sync_with(&sync).await, Ok(true));
        assert!(!network
            .calls()
            .iter()
            .any(|call| matches!(call, NetworkCall::Entities(..))));
    }
}
