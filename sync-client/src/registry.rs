//! Static registry of background workers.
//!
//! Schedulers refer to work by a [`TaskKind`] (or its string name, e.g. when
//! persisted by an OS job scheduler) and build a fresh worker per attempt from
//! a [`WorkerContext`].

use crate::network::ChangeListClient;
use crate::repository::{OfflineFirstNewsRepository, OfflineFirstTopicsRepository};
use crate::synchronizer::Syncable;
use crate::worker::{NoopSyncSubscriber, SyncSubscriber, SyncWorker, Worker};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use sync_store::{NewsResourceDao, SearchIndex, TopicDao, VersionStore};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No worker is registered under this name.
    #[error("unknown task: {0}")]
    UnknownTask(String),
}

/// Kinds of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Bring every collection up to date.
    Sync,
}

/// Builds a worker from the shared context.
pub type WorkerFactory = fn(&WorkerContext) -> Box<dyn Worker>;

impl TaskKind {
    /// All registered kinds.
    pub const ALL: [TaskKind; 1] = [TaskKind::Sync];

    /// Stable name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Sync => "sync",
        }
    }

    /// Factory registered for this kind.
    pub fn factory(&self) -> WorkerFactory {
        match self {
            TaskKind::Sync => build_sync_worker,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownTask(s.to_string()))
    }
}

/// Dependencies shared by every worker.
#[derive(Clone)]
pub struct WorkerContext {
    /// Remote change-list API.
    pub network: Arc<dyn ChangeListClient>,
    /// Version record.
    pub versions: Arc<dyn VersionStore>,
    /// Local topics.
    pub topics: Arc<dyn TopicDao>,
    /// Local news resources.
    pub news: Arc<dyn NewsResourceDao>,
    /// Local search index.
    pub search_index: Arc<dyn SearchIndex>,
    /// Change notification subscription, renewed on every run.
    pub subscriber: Arc<dyn SyncSubscriber>,
    /// Parent token of every run; cancelled at shutdown.
    pub cancel: CancellationToken,
}

impl WorkerContext {
    /// Context over a single store backing every local contract.
    pub fn new<S>(network: Arc<dyn ChangeListClient>, store: S) -> Self
    where
        S: VersionStore + TopicDao + NewsResourceDao + SearchIndex + 'static,
    {
        let store = Arc::new(store);
        Self {
            network,
            versions: store.clone(),
            topics: store.clone(),
            news: store.clone(),
            search_index: store,
            subscriber: Arc::new(NoopSyncSubscriber),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the no-op change notification subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn SyncSubscriber>) -> Self {
        self.subscriber = subscriber;
        self
    }
}

/// Build the worker registered under `name`.
pub fn create_worker(
    name: &str,
    context: &WorkerContext,
) -> Result<Box<dyn Worker>, RegistryError> {
    let kind: TaskKind = name.parse()?;
    Ok(kind.factory()(context))
}

fn build_sync_worker(context: &WorkerContext) -> Box<dyn Worker> {
    let syncables: Vec<Arc<dyn Syncable>> = vec![
        Arc::new(OfflineFirstTopicsRepository::new(
            context.network.clone(),
            context.topics.clone(),
        )),
        Arc::new(OfflineFirstNewsRepository::new(
            context.network.clone(),
            context.news.clone(),
        )),
    ];
    Box::new(
        SyncWorker::new(
            context.versions.clone(),
            syncables,
            context.search_index.clone(),
            context.cancel.child_token(),
        )
        .with_subscriber(context.subscriber.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockChangeListClient;
    use crate::worker::WorkResult;
    use sync_store::MemoryStore;

    #[test]
    fn parse_task_kind() {
        assert_eq!("sync".parse::<TaskKind>(), Ok(TaskKind::Sync));
        assert_eq!(
            "SyncWorker".parse::<TaskKind>(),
            Err(RegistryError::UnknownTask("SyncWorker".into()))
        );
    }

    #[test]
    fn names_round_trip() {
        for kind in TaskKind::ALL {
            assert_eq!(kind.to_string().parse::<TaskKind>(), Ok(kind));
        }
    }

    #[tokio::test]
    async fn created_worker_runs() {
        let context = WorkerContext::new(Arc::new(MockChangeListClient::new()), MemoryStore::new());

        let worker = create_worker("sync", &context).unwrap();
        assert_eq!(worker.do_work().await, Ok(WorkResult::Success));
    }

    #[test]
    fn unknown_name_builds_nothing() {
        let context = WorkerContext::new(Arc::new(MockChangeListClient::new()), MemoryStore::new());
        assert!(create_worker("cleanup", &context).is_err());
    }

    #[tokio::test]
    async fn created_worker_uses_context_subscriber() {
        use crate::synchronizer::SyncError;
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct Counter(AtomicUsize);

        #[async_trait]
        impl SyncSubscriber for Counter {
            async fn subscribe(&self) -> Result<(), SyncError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let counter = Arc::new(Counter::default());
        let context = WorkerContext::new(Arc::new(MockChangeListClient::new()), MemoryStore::new())
            .with_subscriber(counter.clone());

        for _ in 0..2 {
            let worker = create_worker("sync", &context).unwrap();
            assert_eq!(worker.do_work().await, Ok(WorkResult::Success));
        }
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn worker_tokens_follow_context() {
        let context = WorkerContext::new(Arc::new(MockChangeListClient::new()), MemoryStore::new());
        context.cancel.cancel();

        let worker = TaskKind::Sync.factory()(&context);
        assert!(worker.do_work().await.is_err());
    }
}
