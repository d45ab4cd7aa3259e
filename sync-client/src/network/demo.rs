//! Offline change-list client backed by a JSON fixture.
//!
//! Every entity of the fixture is reported as changed at the version equal to
//! its position in the list, so a first sync downloads everything and later
//! syncs find nothing new.

use super::{ChangeListClient, NetworkError};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use sync_types::{ChangeListEntry, CollectionKind, NewsResource, Topic, TypesError, Version};

const BUNDLED_FIXTURE: &str = include_str!("../../fixtures/demo.json");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    news_resources: Vec<NewsResource>,
}

/// Change-list client serving a fixed data set.
#[derive(Debug, Clone)]
pub struct DemoChangeListClient {
    fixture: Fixture,
}

impl DemoChangeListClient {
    /// Client over the fixture shipped with this crate.
    pub fn bundled() -> Result<Self, NetworkError> {
        Self::from_json(BUNDLED_FIXTURE.as_bytes())
    }

    /// Client over a fixture document (`{"topics": [...], "newsResources": [...]}`).
    pub fn from_json(bytes: &[u8]) -> Result<Self, NetworkError> {
        let fixture = serde_json::from_slice(bytes).map_err(TypesError::Decode)?;
        Ok(Self { fixture })
    }

    /// Client over a fixture file.
    pub fn from_path(path: &Path) -> Result<Self, NetworkError> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }
}

fn change_list<T>(
    items: &[T],
    id: impl Fn(&T) -> &str,
    after: Option<Version>,
) -> Vec<ChangeListEntry> {
    let after = after.unwrap_or(Version::NEVER_SYNCED);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| ChangeListEntry::updated(id(item), index as i64))
        .filter(|entry| entry.version > after)
        .collect()
}

fn select<T: Clone>(items: &[T], id: impl Fn(&T) -> &str, ids: &[String]) -> Vec<T> {
    items
        .iter()
        .filter(|item| ids.iter().any(|wanted| wanted == id(item)))
        .cloned()
        .collect()
}

#[async_trait]
impl ChangeListClient for DemoChangeListClient {
    async fn get_change_list(
        &self,
        kind: CollectionKind,
        after: Option<Version>,
    ) -> Result<Vec<ChangeListEntry>, NetworkError> {
        Ok(match kind {
            CollectionKind::Topics => change_list(&self.fixture.topics, |t| t.id.as_str(), after),
            CollectionKind::NewsResources => {
                change_list(&self.fixture.news_resources, |n| n.id.as_str(), after)
            }
        })
    }

    async fn get_topics(&self, ids: &[String]) -> Result<Vec<Topic>, NetworkError> {
        Ok(select(&self.fixture.topics, |t| t.id.as_str(), ids))
    }

    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, NetworkError> {
        Ok(select(&self.fixture.news_resources, |n| n.id.as_str(), ids))
    }
}
