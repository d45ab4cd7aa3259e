//! Run one sync to completion.

use anyhow::Result;
use std::path::Path;
use sync_client::{RetryPolicy, SyncManager, WorkOutcome, WorkerContext};
use sync_store::VersionStore;

use super::{change_list_client, open_store, RemoteArgs};
use crate::config::Config;

/// Run the sync command.
///
/// Makes a single attempt; retrying with backoff is left to `watch`.
/// Returns whether the sync succeeded.
pub async fn run(config: &Config, data_dir: &Path, remote: &RemoteArgs) -> Result<bool> {
    let store = open_store(config, data_dir).await?;
    let network = change_list_client(&config.network, remote)?;

    let manager = SyncManager::new(
        WorkerContext::new(network, store.clone()),
        RetryPolicy::no_retry(),
    );
    let outcome = manager.sync_now().await;

    let versions = store.change_list_versions().await?;
    println!("Sync: {}", describe(outcome));
    println!("  Topics version:         {}", versions.topic_version.value());
    println!("  News resources version: {}", versions.news_resource_version.value());

    Ok(outcome == WorkOutcome::Success)
}

fn describe(outcome: WorkOutcome) -> &'static str {
    match outcome {
        WorkOutcome::Success => "OK",
        WorkOutcome::Failure => "FAILED",
        WorkOutcome::Cancelled => "CANCELLED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use sync_store::{NewsResourceDao, SearchIndex, TopicDao};
    use sync_types::Version;
    use tempfile::tempdir;

    fn demo() -> RemoteArgs {
        RemoteArgs {
            fixture: None,
            demo: true,
        }
    }

    #[tokio::test]
    async fn demo_sync_fills_the_database() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        assert!(run(&config, dir.path(), &demo()).await.unwrap());

        let store = open_store(&config, dir.path()).await.unwrap();
        assert_eq!(store.topic_count().await.unwrap(), 4);
        assert_eq!(store.news_resource_count().await.unwrap(), 4);
        let versions = store.change_list_versions().await.unwrap();
        assert_eq!(versions.topic_version, Version::new(3));
        assert_eq!(versions.news_resource_version, Version::new(3));
        assert!(!store.search("testing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_sync_succeeds_without_changes() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        assert!(run(&config, dir.path(), &demo()).await.unwrap());
        assert!(run(&config, dir.path(), &demo()).await.unwrap());

        let store = open_store(&config, dir.path()).await.unwrap();
        assert_eq!(store.topic_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn custom_fixture() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("fixture.json");
        std::fs::write(
            &fixture,
            r#"{"topics": [{"id": "a", "name": "Only topic"}], "newsResources": []}"#,
        )
        .unwrap();
        let remote = RemoteArgs {
            fixture: Some(fixture),
            demo: false,
        };

        assert!(run(&Config::default(), dir.path(), &remote).await.unwrap());

        let store = open_store(&Config::default(), dir.path()).await.unwrap();
        assert_eq!(store.topic_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreachable_remote_fails() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        // Nothing listens on the discard port
        config.network.base_url = Some("http://127.0.0.1:9".into());
        config.network.timeout_secs = 2;

        assert!(!run(&config, dir.path(), &RemoteArgs::default()).await.unwrap());

        let store = open_store(&config, dir.path()).await.unwrap();
        assert!(!store.change_list_versions().await.unwrap().topic_version.is_synced());
    }

    #[tokio::test]
    async fn missing_fixture_is_an_error() {
        let dir = tempdir().unwrap();
        let remote = RemoteArgs {
            fixture: Some(PathBuf::from("/nonexistent/fixture.json")),
            demo: false,
        };
        assert!(run(&Config::default(), dir.path(), &remote).await.is_err());
    }
}
