//! Remote change-list API for feedsync.
//!
//! The sync engine consumes the remote service through the
//! [`ChangeListClient`] trait:
//! - `get_change_list()` lists what changed in a collection after a version
//! - `get_topics()` / `get_news_resources()` fetch full payloads by id
//!
//! Implementations: [`HttpChangeListClient`] (JSON over HTTP),
//! [`DemoChangeListClient`] (bundled or file fixture, offline) and
//! [`MockChangeListClient`] (scripted, for tests).
//!
//! Retry and backoff of individual requests is not done here: a failed call
//! fails the collection's sync pass, and the whole run is retried by
//! [`SyncManager`](crate::SyncManager).

mod demo;
mod http;
mod mock;

pub use demo::DemoChangeListClient;
pub use http::HttpChangeListClient;
pub use mock::{MockChangeListClient, NetworkCall};

use async_trait::async_trait;
use sync_types::{ChangeListEntry, CollectionKind, Entity, NewsResource, Topic, TypesError, Version};
use thiserror::Error;

/// Network errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Remote answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(u16),

    /// Response body is not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] TypesError),

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// Fixture file could not be read.
    #[error("fixture error: {0}")]
    Fixture(#[from] std::io::Error),

    /// Failure injected by a test double.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            NetworkError::Timeout
        } else {
            NetworkError::Request(error)
        }
    }
}

/// Remote source of change lists and entity payloads.
#[async_trait]
pub trait ChangeListClient: Send + Sync {
    /// List the changes of `kind` with a version strictly greater than `after`.
    ///
    /// `None` lists the whole collection. Entries come in ascending version
    /// order.
    async fn get_change_list(
        &self,
        kind: CollectionKind,
        after: Option<Version>,
    ) -> Result<Vec<ChangeListEntry>, NetworkError>;

    /// Fetch full topics by id. Unknown ids are left out.
    async fn get_topics(&self, ids: &[String]) -> Result<Vec<Topic>, NetworkError>;

    /// Fetch full news resources by id. Unknown ids are left out.
    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, NetworkError>;

    /// Fetch full entities of any collection by id.
    async fn get_entities(
        &self,
        kind: CollectionKind,
        ids: &[String],
    ) -> Result<Vec<Entity>, NetworkError> {
        let entities = match kind {
            CollectionKind::Topics => self
                .get_topics(ids)
                .await?
                .into_iter()
                .map(Entity::from)
                .collect(),
            CollectionKind::NewsResources => self
                .get_news_resources(ids)
                .await?
                .into_iter()
                .map(Entity::from)
                .collect(),
        };
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(NetworkError::Status(503).to_string(), "unexpected status: 503");
        assert_eq!(NetworkError::Timeout.to_string(), "request timeout");
    }

    #[tokio::test]
    async fn get_entities_dispatches_on_kind() {
        let client = MockChangeListClient::new();
        client.add_topic(Topic {
            id: "t1".into(),
            name: "Compose".into(),
            short_description: String::new(),
            long_description: String::new(),
            url: String::new(),
            image_url: String::new(),
        });

        let entities = client
            .get_entities(CollectionKind::Topics, &["t1".into()])
            .await
            .unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind(), CollectionKind::Topics);
        assert_eq!(entities[0].id(), "t1");

        let news = client
            .get_entities(CollectionKind::NewsResources, &["t1".into()])
            .await
            .unwrap();
        assert!(news.is_empty());
    }
}
