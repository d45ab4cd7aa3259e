use crate::network::ChangeListClient;
use crate::synchronizer::{change_list_sync, Cancelled, SyncError, Syncable, Synchronizer};
use async_trait::async_trait;
use std::sync::Arc;
use sync_store::{NewsResourceDao, StorageError};
use sync_types::{ChangeListEntry, ChangeListVersions, CollectionKind, NewsResource, Version};

/// News resources, read locally and synced from the remote news change list.
#[derive(Clone)]
pub struct OfflineFirstNewsRepository {
    network: Arc<dyn ChangeListClient>,
    dao: Arc<dyn NewsResourceDao>,
}

impl OfflineFirstNewsRepository {
    /// Create a repository over a remote client and local news storage.
    pub fn new(network: Arc<dyn ChangeListClient>, dao: Arc<dyn NewsResourceDao>) -> Self {
        Self { network, dao }
    }

    /// All locally stored news resources, newest first.
    pub async fn news_resources(&self) -> Result<Vec<NewsResource>, StorageError> {
        self.dao.news_resources().await
    }

    /// Locally stored news resources of one topic, newest first.
    pub async fn news_resources_for_topic(
        &self,
        topic_id: &str,
    ) -> Result<Vec<NewsResource>, StorageError> {
        self.dao.news_resources_for_topic(topic_id).await
    }

    async fn fetch_change_list(&self, after: Version) -> Result<Vec<ChangeListEntry>, SyncError> {
        Ok(self
            .network
            .get_change_list(CollectionKind::NewsResources, Some(after))
            .await?)
    }

    async fn delete(&self, ids: Vec<String>) -> Result<(), SyncError> {
        if !ids.is_empty() {
            self.dao.delete_news_resources(ids).await?;
        }
        Ok(())
    }

    async fn fetch_and_upsert(&self, ids: Vec<String>) -> Result<(), SyncError> {
        if ids.is_empty() {
            return Ok(());
        }
        let news = self.network.get_news_resources(&ids).await?;
        self.dao.upsert_news_resources(news).await?;
        Ok(())
    }
}

fn news_resource_version(versions: &ChangeListVersions) -> Version {
    versions.news_resource_version
}

fn with_news_resource_version(versions: ChangeListVersions, version: Version) -> ChangeListVersions {
    versions.with(CollectionKind::NewsResources, version)
}

#[async_trait]
impl Syncable for OfflineFirstNewsRepository {
    fn kind(&self) -> CollectionKind {
        CollectionKind::NewsResources
    }

    async fn sync_with(&self, synchronizer: &dyn Synchronizer) -> Result<bool, Cancelled> {
        change_list_sync(
            synchronizer,
            CollectionKind::NewsResources,
            news_resource_version,
            |after| self.fetch_change_list(after),
            with_news_resource_version,
            |ids| self.delete(ids),
            |ids| self.fetch_and_upsert(ids),
        )
        .await
    }
}
