//! # sync-store
//!
//! Local-first storage for feedsync.
//!
//! Reads are served exclusively from local storage so the application works
//! offline; the sync engine is the only writer. This crate defines the storage
//! contracts the sync engine consumes and two backends:
//!
//! - [`SqliteStore`] - durable SQLite database (WAL mode)
//! - [`MemoryStore`] - in-memory store with failure injection, for tests and demos
//!
//! Deletes and upserts are idempotent: deleting an absent id is a no-op and
//! upserting an existing id replaces it. Reconciliation relies on this when a
//! pass is re-applied after a crash between the writes and the version update.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
mod memory;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryStore, StoreWrite};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use sync_types::{ChangeListVersions, NewsResource, Topic};

/// Read-modify-write applied atomically to the version record.
pub type VersionUpdate = Box<dyn FnOnce(ChangeListVersions) -> ChangeListVersions + Send>;

/// Durable record of the per-collection change-list versions.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Read the current version record.
    ///
    /// A store that never synced returns every version at `-1`.
    async fn change_list_versions(&self) -> StorageResult<ChangeListVersions>;

    /// Atomically replace the version record with `update(current)`.
    ///
    /// Returns the record as written.
    async fn update_change_list_versions(
        &self,
        update: VersionUpdate,
    ) -> StorageResult<ChangeListVersions>;
}

/// Local storage of topics.
#[async_trait]
pub trait TopicDao: Send + Sync {
    /// Insert or replace topics by id.
    async fn upsert_topics(&self, topics: Vec<Topic>) -> StorageResult<()>;

    /// Delete topics by id. Unknown ids are ignored.
    async fn delete_topics(&self, ids: Vec<String>) -> StorageResult<()>;

    /// All topics, ordered by id.
    async fn topics(&self) -> StorageResult<Vec<Topic>>;

    /// A single topic.
    async fn topic(&self, id: &str) -> StorageResult<Option<Topic>>;

    /// Number of stored topics.
    async fn topic_count(&self) -> StorageResult<u64>;
}

/// Local storage of news resources.
#[async_trait]
pub trait NewsResourceDao: Send + Sync {
    /// Insert or replace news resources by id, including their topic links.
    async fn upsert_news_resources(&self, news: Vec<NewsResource>) -> StorageResult<()>;

    /// Delete news resources by id. Unknown ids are ignored.
    async fn delete_news_resources(&self, ids: Vec<String>) -> StorageResult<()>;

    /// All news resources, newest first.
    async fn news_resources(&self) -> StorageResult<Vec<NewsResource>>;

    /// News resources linked to a topic, newest first.
    async fn news_resources_for_topic(&self, topic_id: &str) -> StorageResult<Vec<NewsResource>>;

    /// Number of stored news resources.
    async fn news_resource_count(&self) -> StorageResult<u64>;
}

/// Matches of a search query, by collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHits {
    /// Ids of matching topics.
    pub topic_ids: Vec<String>,
    /// Ids of matching news resources.
    pub news_resource_ids: Vec<String>,
}

impl SearchHits {
    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.topic_ids.is_empty() && self.news_resource_ids.is_empty()
    }
}

/// Full-text search index derived from the local entities.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Rebuild the index from the entities currently stored.
    ///
    /// Returns the number of indexed rows.
    async fn rebuild(&self) -> StorageResult<u64>;

    /// Case-insensitive search over names, titles, descriptions and content.
    async fn search(&self, query: &str) -> StorageResult<SearchHits>;
}

/// Normalize text for the search index.
pub(crate) fn search_text(parts: &[&str]) -> String {
    parts.join(" ").to_lowercase()
}
