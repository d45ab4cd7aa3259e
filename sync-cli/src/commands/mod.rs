//! CLI command implementations.

pub mod browse;
pub mod search;
pub mod status;
pub mod sync;
pub mod watch;

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sync_client::{ChangeListClient, DemoChangeListClient, HttpChangeListClient};
use sync_store::SqliteStore;

use crate::config::{Config, NetworkConfig};

/// Where remote changes come from.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Serve changes from a JSON fixture file instead of the remote API
    #[arg(long, conflicts_with = "demo")]
    pub fixture: Option<PathBuf>,

    /// Serve changes from the bundled demo data set
    #[arg(long)]
    pub demo: bool,
}

/// Build the change-list client selected by the arguments and configuration.
pub fn change_list_client(
    network: &NetworkConfig,
    remote: &RemoteArgs,
) -> Result<Arc<dyn ChangeListClient>> {
    if let Some(path) = &remote.fixture {
        let client = DemoChangeListClient::from_path(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        return Ok(Arc::new(client));
    }
    if remote.demo {
        return Ok(Arc::new(DemoChangeListClient::bundled()?));
    }

    let base_url = network
        .base_url
        .as_deref()
        .context("No remote configured. Set [network] base_url or pass --demo / --fixture.")?;
    let client = HttpChangeListClient::new(base_url, Duration::from_secs(network.timeout_secs))?;
    Ok(Arc::new(client))
}

/// Open the local database.
pub async fn open_store(config: &Config, data_dir: &Path) -> Result<SqliteStore> {
    let path = config.database_path(data_dir);
    SqliteStore::open(&path)
        .await
        .with_context(|| format!("Failed to open database {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_flag_selects_bundled_data() {
        let remote = RemoteArgs {
            fixture: None,
            demo: true,
        };
        assert!(change_list_client(&NetworkConfig::default(), &remote).is_ok());
    }

    #[test]
    fn no_remote_is_an_error() {
        let result = change_list_client(&NetworkConfig::default(), &RemoteArgs::default());
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("No remote configured"));
    }

    #[test]
    fn base_url_selects_http() {
        let network = NetworkConfig {
            base_url: Some("https://example.com/api".into()),
            timeout_secs: 5,
        };
        assert!(change_list_client(&network, &RemoteArgs::default()).is_ok());
    }
}
