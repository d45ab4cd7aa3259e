//! Mock change-list client for testing.
//!
//! Serves scripted change lists and entities, records every call, and can
//! fail or hold calls on demand.

use super::{ChangeListClient, NetworkError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use sync_types::{ChangeListEntry, CollectionKind, NewsResource, Topic, Version};
use tokio::sync::watch;

/// A call received by [`MockChangeListClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkCall {
    /// `get_change_list(kind, after)`
    ChangeList(CollectionKind, Option<Version>),
    /// `get_topics(ids)` or `get_news_resources(ids)`
    Entities(CollectionKind, Vec<String>),
}

/// Mock change-list client for testing.
///
/// Change lists are filtered by the `after` cursor like the real service.
/// Clones share state.
#[derive(Debug, Clone)]
pub struct MockChangeListClient {
    inner: Arc<Mutex<MockInner>>,
    gate: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockInner {
    change_lists: HashMap<CollectionKind, Vec<ChangeListEntry>>,
    topics: BTreeMap<String, Topic>,
    news: BTreeMap<String, NewsResource>,
    calls: Vec<NetworkCall>,
    fail_next_change_list: HashMap<CollectionKind, String>,
    fail_next_entities: HashMap<CollectionKind, String>,
}

impl Default for MockChangeListClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChangeListClient {
    /// Create a mock with empty collections.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(MockInner::default())),
            gate: Arc::new(gate),
        }
    }

    /// Replace the change list of a collection.
    pub fn set_change_list(&self, kind: CollectionKind, entries: Vec<ChangeListEntry>) {
        let mut inner = self.inner.lock().unwrap();
        inner.change_lists.insert(kind, entries);
    }

    /// Make a topic available to `get_topics()`.
    pub fn add_topic(&self, topic: Topic) {
        let mut inner = self.inner.lock().unwrap();
        inner.topics.insert(topic.id.clone(), topic);
    }

    /// Make a news resource available to `get_news_resources()`.
    pub fn add_news_resource(&self, news: NewsResource) {
        let mut inner = self.inner.lock().unwrap();
        inner.news.insert(news.id.clone(), news);
    }

    /// Cause the next change-list call for `kind` to fail.
    pub fn fail_next_change_list(&self, kind: CollectionKind, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_change_list.insert(kind, error.to_string());
    }

    /// Cause the next entity call for `kind` to fail.
    pub fn fail_next_entities(&self, kind: CollectionKind, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_entities.insert(kind, error.to_string());
    }

    /// Get all calls received so far, in order.
    pub fn calls(&self) -> Vec<NetworkCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Number of change-list calls received so far.
    pub fn change_list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, NetworkCall::ChangeList(..)))
            .count()
    }

    /// Hold change-list calls in flight until [`release`](Self::release).
    ///
    /// Calls are recorded before they block.
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held change-list calls proceed.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    fn record(&self, call: NetworkCall) {
        self.inner.lock().unwrap().calls.push(call);
    }

    fn take_failure(
        failures: &mut HashMap<CollectionKind, String>,
        kind: CollectionKind,
    ) -> Result<(), NetworkError> {
        match failures.remove(&kind) {
            Some(error) => Err(NetworkError::Injected(error)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChangeListClient for MockChangeListClient {
    async fn get_change_list(
        &self,
        kind: CollectionKind,
        after: Option<Version>,
    ) -> Result<Vec<ChangeListEntry>, NetworkError> {
        self.record(NetworkCall::ChangeList(kind, after));

        let mut gate = self.gate.subscribe();
        // Sender lives in self, so the channel cannot close here
        let _ = gate.wait_for(|open| *open).await;

        let mut inner = self.inner.lock().unwrap();
        Self::take_failure(&mut inner.fail_next_change_list, kind)?;

        let after = after.unwrap_or(Version::NEVER_SYNCED);
        Ok(inner
            .change_lists
            .get(&kind)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.version > after)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_topics(&self, ids: &[String]) -> Result<Vec<Topic>, NetworkError> {
        self.record(NetworkCall::Entities(CollectionKind::Topics, ids.to_vec()));

        let mut inner = self.inner.lock().unwrap();
        Self::take_failure(&mut inner.fail_next_entities, CollectionKind::Topics)?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.topics.get(id).cloned())
            .collect())
    }

    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, NetworkError> {
        self.record(NetworkCall::Entities(
            CollectionKind::NewsResources,
            ids.to_vec(),
        ));

        let mut inner = self.inner.lock().unwrap();
        Self::take_failure(&mut inner.fail_next_entities, CollectionKind::NewsResources)?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.news.get(id).cloned())
            .collect())
    }
}
