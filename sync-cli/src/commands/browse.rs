//! List locally stored topics and news.
//!
//! Reads only the local database, so it works offline.

use anyhow::{bail, Result};
use std::path::Path;
use sync_store::{NewsResourceDao, TopicDao};
use sync_types::{NewsResource, Topic};

use super::open_store;
use crate::config::Config;

/// List all topics.
pub async fn topics(config: &Config, data_dir: &Path) -> Result<()> {
    let store = open_store(config, data_dir).await?;
    let topics = store.topics().await?;
    if topics.is_empty() {
        println!("No topics. Run 'feedsync sync' first.");
        return Ok(());
    }
    for topic in &topics {
        println!("{}", topic_line(topic));
    }
    Ok(())
}

/// List news resources, newest first, optionally for one topic.
pub async fn news(config: &Config, data_dir: &Path, topic: Option<&str>) -> Result<()> {
    let store = open_store(config, data_dir).await?;
    let news = match topic {
        Some(id) => {
            if store.topic(id).await?.is_none() {
                bail!("Unknown topic: {id}");
            }
            store.news_resources_for_topic(id).await?
        }
        None => store.news_resources().await?,
    };
    if news.is_empty() {
        println!("No news resources.");
        return Ok(());
    }
    for resource in &news {
        println!("{}", news_line(resource));
    }
    Ok(())
}

pub(crate) fn topic_line(topic: &Topic) -> String {
    if topic.short_description.is_empty() {
        format!("[{}] {}", topic.id, topic.name)
    } else {
        format!("[{}] {}: {}", topic.id, topic.name, topic.short_description)
    }
}

pub(crate) fn news_line(resource: &NewsResource) -> String {
    format!(
        "[{}] {} {} ({})",
        resource.id, resource.publish_date, resource.title, resource.resource_type
    )
}
