//! Show sync status.

use anyhow::Result;
use std::path::Path;
use sync_store::{NewsResourceDao, TopicDao, VersionStore};
use sync_types::Version;

use super::open_store;
use crate::config::Config;

/// Run the status command.
pub async fn run(config: &Config, data_dir: &Path) -> Result<()> {
    println!("=== feedsync status ===");
    println!();

    let path = config.database_path(data_dir);
    println!("Database: {}", path.display());
    if !path.exists() {
        println!("  NOT CREATED");
        println!();
        println!("Run 'feedsync sync' to download the feed.");
        return Ok(());
    }

    let store = open_store(config, data_dir).await?;
    let versions = store.change_list_versions().await?;
    let topics = store.topic_count().await?;
    let news = store.news_resource_count().await?;

    println!();
    println!("Topics:");
    println!("  Count:   {topics}");
    println!("  Version: {}", format_version(versions.topic_version));
    println!();
    println!("News resources:");
    println!("  Count:   {news}");
    println!("  Version: {}", format_version(versions.news_resource_version));
    println!();

    match &config.network.base_url {
        Some(url) => println!("Remote: {url}"),
        None => println!("Remote: NOT CONFIGURED (use --demo or --fixture)"),
    }

    Ok(())
}

fn format_version(version: Version) -> String {
    if version.is_synced() {
        version.to_string()
    } else {
        "never synced".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{sync, RemoteArgs};
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_without_database() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        assert!(run(&config, dir.path()).await.is_ok());
        // Status must not create the database
        assert!(!config.database_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn status_after_sync() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let remote = RemoteArgs {
            fixture: None,
            demo: true,
        };
        assert!(sync::run(&config, dir.path(), &remote).await.unwrap());

        assert!(run(&config, dir.path()).await.is_ok());
    }

    #[test]
    fn format_version_works() {
        assert_eq!(format_version(Version::NEVER_SYNCED), "never synced");
        assert_eq!(format_version(Version::new(0)), "0");
        assert_eq!(format_version(Version::new(42)), "42");
    }
}
