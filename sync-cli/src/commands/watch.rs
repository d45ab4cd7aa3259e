//! Keep the local database in sync until interrupted.

use anyhow::Result;
use std::future::Future;
use std::path::Path;
use sync_client::{spawn_periodic_sync, SyncManager, WorkerContext, WorkerState};

use super::{change_list_client, open_store, RemoteArgs};
use crate::config::Config;

/// Run the watch command until Ctrl-C.
pub async fn run(config: &Config, data_dir: &Path, remote: &RemoteArgs) -> Result<()> {
    run_until(config, data_dir, remote, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl-C");
        }
    })
    .await
}

/// Startup sync, then periodic syncs with retries, until `shutdown` resolves.
pub async fn run_until(
    config: &Config,
    data_dir: &Path,
    remote: &RemoteArgs,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let store = open_store(config, data_dir).await?;
    let network = change_list_client(&config.network, remote)?;
    let manager = SyncManager::new(
        WorkerContext::new(network, store),
        config.sync.retry_policy(),
    );

    let periodic = config
        .sync
        .periodic_interval()
        .map(|period| spawn_periodic_sync(manager.clone(), period));

    let mut status = manager.is_syncing();
    manager.initialize();
    println!("Watching for changes (Ctrl-C to stop)");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = status.changed() => match changed {
                Some(true) => println!("Syncing..."),
                Some(false) => println!("{}", describe(&manager.state())),
                None => break,
            },
        }
    }

    manager.shutdown().await;
    if let Some(handle) = periodic {
        handle.await?;
    }
    println!("Stopped");
    Ok(())
}

fn describe(state: &WorkerState) -> String {
    match state {
        WorkerState::Succeeded => "Up to date".to_string(),
        WorkerState::Failed {
            attempt,
            retry_pending: true,
        } => format!("Attempt {attempt} failed, retry scheduled"),
        WorkerState::Failed { attempt, .. } => {
            format!("Sync failed after {attempt} attempt(s)")
        }
        WorkerState::Idle | WorkerState::Running { .. } => "Idle".to_string(),
    }
}
