//! In-memory store for tests and demos.
//!
//! Records every successful write and allows injecting one-shot failures per
//! operation, so sync behavior can be verified without a database.

use crate::error::StorageError;
use crate::{
    search_text, NewsResourceDao, SearchHits, SearchIndex, TopicDao, VersionStore, VersionUpdate,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use sync_types::{ChangeListVersions, CollectionKind, NewsResource, Topic};

/// A write observed by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// Entities deleted from a collection.
    Delete(CollectionKind, Vec<String>),
    /// Entities upserted into a collection.
    Upsert(CollectionKind, Vec<String>),
    /// Version record replaced.
    Versions(ChangeListVersions),
    /// Search index rebuilt.
    RebuildIndex,
}

/// In-memory store.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    topics: BTreeMap<String, Topic>,
    news: BTreeMap<String, NewsResource>,
    versions: ChangeListVersions,
    index: Vec<(CollectionKind, String, String)>,
    writes: Vec<StoreWrite>,
    fail_next_delete: HashMap<CollectionKind, String>,
    fail_next_upsert: HashMap<CollectionKind, String>,
    fail_next_version_update: Option<String>,
    fail_next_rebuild: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an existing version record.
    pub fn with_versions(versions: ChangeListVersions) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().versions = versions;
        store
    }

    /// Get all successful writes, in order.
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.inner.lock().unwrap().writes.clone()
    }

    /// Forget recorded writes (entities and versions are kept).
    pub fn clear_writes(&self) {
        self.inner.lock().unwrap().writes.clear();
    }

    /// Cause the next delete on `kind` to fail.
    pub fn fail_next_delete(&self, kind: CollectionKind, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_delete.insert(kind, error.to_string());
    }

    /// Cause the next upsert on `kind` to fail.
    pub fn fail_next_upsert(&self, kind: CollectionKind, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_upsert.insert(kind, error.to_string());
    }

    /// Cause the next version update to fail.
    pub fn fail_next_version_update(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_version_update = Some(error.to_string());
    }

    /// Cause the next search index rebuild to fail.
    pub fn fail_next_rebuild(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_rebuild = Some(error.to_string());
    }

    fn delete(&self, kind: CollectionKind, ids: Vec<String>) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_delete.remove(&kind) {
            return Err(StorageError::Injected(error));
        }
        for id in &ids {
            match kind {
                CollectionKind::Topics => {
                    inner.topics.remove(id);
                }
                CollectionKind::NewsResources => {
                    inner.news.remove(id);
                }
            }
        }
        inner.writes.push(StoreWrite::Delete(kind, ids));
        Ok(())
    }

    fn take_upsert_failure(&self, kind: CollectionKind) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.fail_next_upsert.remove(&kind) {
            Some(error) => Err(StorageError::Injected(error)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn change_list_versions(&self) -> Result<ChangeListVersions, StorageError> {
        Ok(self.inner.lock().unwrap().versions)
    }

    async fn update_change_list_versions(
        &self,
        update: VersionUpdate,
    ) -> Result<ChangeListVersions, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_version_update.take() {
            return Err(StorageError::Injected(error));
        }
        let updated = update(inner.versions);
        inner.versions = updated;
        inner.writes.push(StoreWrite::Versions(updated));
        Ok(updated)
    }
}

#[async_trait]
impl TopicDao for MemoryStore {
    async fn upsert_topics(&self, topics: Vec<Topic>) -> Result<(), StorageError> {
        self.take_upsert_failure(CollectionKind::Topics)?;
        let mut inner = self.inner.lock().unwrap();
        let ids = topics.iter().map(|t| t.id.clone()).collect();
        for topic in topics {
            inner.topics.insert(topic.id.clone(), topic);
        }
        inner.writes.push(StoreWrite::Upsert(CollectionKind::Topics, ids));
        Ok(())
    }

    async fn delete_topics(&self, ids: Vec<String>) -> Result<(), StorageError> {
        self.delete(CollectionKind::Topics, ids)
    }

    async fn topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(self.inner.lock().unwrap().topics.values().cloned().collect())
    }

    async fn topic(&self, id: &str) -> Result<Option<Topic>, StorageError> {
        Ok(self.inner.lock().unwrap().topics.get(id).cloned())
    }

    async fn topic_count(&self) -> Result<u64, StorageError> {
        Ok(self.inner.lock().unwrap().topics.len() as u64)
    }
}

#[async_trait]
impl NewsResourceDao for MemoryStore {
    async fn upsert_news_resources(&self, news: Vec<NewsResource>) -> Result<(), StorageError> {
        self.take_upsert_failure(CollectionKind::NewsResources)?;
        let mut inner = self.inner.lock().unwrap();
        let ids = news.iter().map(|n| n.id.clone()).collect();
        for resource in news {
            inner.news.insert(resource.id.clone(), resource);
        }
        inner
            .writes
            .push(StoreWrite::Upsert(CollectionKind::NewsResources, ids));
        Ok(())
    }

    async fn delete_news_resources(&self, ids: Vec<String>) -> Result<(), StorageError> {
        self.delete(CollectionKind::NewsResources, ids)
    }

    async fn news_resources(&self) -> Result<Vec<NewsResource>, StorageError> {
        let inner = self.inner.lock().unwrap();
        Ok(newest_first(inner.news.values().cloned().collect()))
    }

    async fn news_resources_for_topic(
        &self,
        topic_id: &str,
    ) -> Result<Vec<NewsResource>, StorageError> {
        let inner = self.inner.lock().unwrap();
        let linked = inner
            .news
            .values()
            .filter(|n| n.topics.iter().any(|t| t == topic_id))
            .cloned()
            .collect();
        Ok(newest_first(linked))
    }

    async fn news_resource_count(&self) -> Result<u64, StorageError> {
        Ok(self.inner.lock().unwrap().news.len() as u64)
    }
}

#[async_trait]
impl SearchIndex for MemoryStore {
    async fn rebuild(&self) -> Result<u64, StorageError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_rebuild.take() {
            return Err(StorageError::Injected(error));
        }

        let mut index = Vec::with_capacity(inner.topics.len() + inner.news.len());
        for topic in inner.topics.values() {
            let content = search_text(&[
                &topic.name,
                &topic.short_description,
                &topic.long_description,
            ]);
            index.push((CollectionKind::Topics, topic.id.clone(), content));
        }
        for resource in inner.news.values() {
            let content = search_text(&[&resource.title, &resource.content]);
            index.push((CollectionKind::NewsResources, resource.id.clone(), content));
        }

        let indexed = index.len() as u64;
        inner.index = index;
        inner.writes.push(StoreWrite::RebuildIndex);
        Ok(indexed)
    }

    async fn search(&self, query: &str) -> Result<SearchHits, StorageError> {
        let query = query.trim().to_lowercase();
        let mut hits = SearchHits::default();
        if query.is_empty() {
            return Ok(hits);
        }

        let inner = self.inner.lock().unwrap();
        for (kind, id, content) in &inner.index {
            if !content.contains(&query) {
                continue;
            }
            match kind {
                CollectionKind::Topics => hits.topic_ids.push(id.clone()),
                CollectionKind::NewsResources => hits.news_resource_ids.push(id.clone()),
            }
        }
        Ok(hits)
    }
}

fn newest_first(mut news: Vec<NewsResource>) -> Vec<NewsResource> {
    news.sort_by(|a, b| b.publish_date.cmp(&a.publish_date).then(a.id.cmp(&b.id)));
    news
}
