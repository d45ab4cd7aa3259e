//! Change-list entries and the synced domain records.
//!
//! Field names on the wire follow the remote JSON API (camelCase).

use serde::{Deserialize, Serialize};

use crate::{CollectionKind, Version};

/// One row of a remote change list.
///
/// Describes that the entity `id` changed (or was deleted) at `version`.
/// Transient: fetched from the remote, consumed once per sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeListEntry {
    /// Id of the changed entity
    pub id: String,
    /// Version at which the change happened
    #[serde(rename = "changeListVersion")]
    pub version: Version,
    /// Whether the entity was deleted server-side
    pub is_delete: bool,
}

impl ChangeListEntry {
    /// An entry for an added or updated entity.
    pub fn updated(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            version: Version::new(version),
            is_delete: false,
        }
    }

    /// An entry for a deleted entity.
    pub fn deleted(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            version: Version::new(version),
            is_delete: true,
        }
    }
}

/// A followable topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Stable topic id
    pub id: String,
    /// Display name
    pub name: String,
    /// One-line description
    #[serde(default)]
    pub short_description: String,
    /// Full description
    #[serde(default)]
    pub long_description: String,
    /// Link to the topic page
    #[serde(default)]
    pub url: String,
    /// Topic image
    #[serde(default)]
    pub image_url: String,
}

/// A piece of news content (article, video, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResource {
    /// Stable news resource id
    pub id: String,
    /// Headline
    pub title: String,
    /// Body or summary
    #[serde(default)]
    pub content: String,
    /// Link to the full resource
    #[serde(default)]
    pub url: String,
    /// Optional header image
    #[serde(default)]
    pub header_image_url: Option<String>,
    /// RFC 3339 publish timestamp
    pub publish_date: String,
    /// Resource type ("Article", "Video", ...)
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// Ids of the topics this resource belongs to
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A synced entity of any collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// A topic
    Topic(Topic),
    /// A news resource
    NewsResource(NewsResource),
}

impl Entity {
    /// Id of the wrapped record.
    pub fn id(&self) -> &str {
        match self {
            Entity::Topic(topic) => &topic.id,
            Entity::NewsResource(news) => &news.id,
        }
    }

    /// Collection the record belongs to.
    pub fn kind(&self) -> CollectionKind {
        match self {
            Entity::Topic(_) => CollectionKind::Topics,
            Entity::NewsResource(_) => CollectionKind::NewsResources,
        }
    }
}

impl From<Topic> for Entity {
    fn from(topic: Topic) -> Self {
        Entity::Topic(topic)
    }
}

impl From<NewsResource> for Entity {
    fn from(news: NewsResource) -> Self {
        Entity::NewsResource(news)
    }
}
