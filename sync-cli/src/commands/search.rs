//! Search the local index.

use anyhow::Result;
use std::path::Path;
use sync_store::{NewsResourceDao, SearchIndex, TopicDao};

use super::browse::{news_line, topic_line};
use super::open_store;
use crate::config::Config;

/// Run the search command. Returns the number of matches.
pub async fn run(config: &Config, data_dir: &Path, query: &str) -> Result<usize> {
    let store = open_store(config, data_dir).await?;
    let hits = store.search(query).await?;
    if hits.is_empty() {
        println!("No matches for \"{query}\"");
        return Ok(0);
    }

    let mut found = 0;
    if !hits.topic_ids.is_empty() {
        println!("Topics:");
        for id in &hits.topic_ids {
            // The index is rebuilt after each sync, so entries can only lag
            if let Some(topic) = store.topic(id).await? {
                println!("  {}", topic_line(&topic));
                found += 1;
            }
        }
    }

    if !hits.news_resource_ids.is_empty() {
        let news = store.news_resources().await?;
        println!("News:");
        for resource in news
            .iter()
            .filter(|n| hits.news_resource_ids.contains(&n.id))
        {
            println!("  {}", news_line(resource));
            found += 1;
        }
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{sync, RemoteArgs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn finds_synced_content() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let remote = RemoteArgs {
            fixture: None,
            demo: true,
        };
        assert!(sync::run(&config, dir.path(), &remote).await.unwrap());

        assert!(run(&config, dir.path(), "testing").await.unwrap() > 0);
        assert_eq!(run(&config, dir.path(), "zzzz-no-match").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_database_has_no_matches() {
        let dir = tempdir().unwrap();
        assert_eq!(run(&Config::default(), dir.path(), "anything").await.unwrap(), 0);
    }
}
