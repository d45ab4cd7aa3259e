//! JSON-over-HTTP change-list client.

use super::{ChangeListClient, NetworkError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use sync_types::{ChangeListEntry, CollectionKind, NetworkResponse, NewsResource, Topic, Version};

/// Change-list client for the remote REST API.
///
/// Endpoints, relative to the base URL:
/// - `GET changelists/{kind}?after={version}`
/// - `GET {kind}?id={id}&id={id}`
///
/// Every response body is wrapped as `{"data": ...}`.
#[derive(Debug, Clone)]
pub struct HttpChangeListClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChangeListClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NetworkError> {
        let url = self.url(path);
        tracing::trace!(%url, params = query.len(), "GET");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(NetworkResponse::<T>::from_json(&body)?.into_data())
    }
}

fn id_params(ids: &[String]) -> Vec<(&'static str, String)> {
    ids.iter().map(|id| ("id", id.clone())).collect()
}

#[async_trait]
impl ChangeListClient for HttpChangeListClient {
    async fn get_change_list(
        &self,
        kind: CollectionKind,
        after: Option<Version>,
    ) -> Result<Vec<ChangeListEntry>, NetworkError> {
        let query: Vec<(&str, String)> = after
            .map(|version| vec![("after", version.value().to_string())])
            .unwrap_or_default();
        self.get(&format!("changelists/{}", kind.as_str()), &query)
            .await
    }

    async fn get_topics(&self, ids: &[String]) -> Result<Vec<Topic>, NetworkError> {
        self.get(CollectionKind::Topics.as_str(), &id_params(ids))
            .await
    }

    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, NetworkError> {
        self.get(CollectionKind::NewsResources.as_str(), &id_params(ids))
            .await
    }
}
