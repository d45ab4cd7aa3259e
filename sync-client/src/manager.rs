//! Sync scheduling and status.
//!
//! [`SyncManager`] is the trigger surface of the sync engine. App startup, a
//! periodic timer or a push message call [`SyncManager::request_sync`]; at
//! most one run exists at a time and further requests are coalesced into it.
//!
//! A run is driven on a spawned task by the pure [`WorkerState`] machine:
//! build a worker from the registry, run it, feed the result back, and sleep
//! the backoff before a retry. The "is syncing" flag is published on a
//! `watch` channel that any number of observers can follow.

use crate::registry::{TaskKind, WorkerContext};
use crate::synchronizer::Cancelled;
use crate::worker::WorkResult;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use sync_core::{Action, Event, RetryPolicy, WorkOutcome, WorkerState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// What became of a sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRequest {
    /// A new run was started.
    Started,
    /// A run was already in flight or waiting for a retry; it covers this request.
    Coalesced,
    /// The manager is shut down.
    Rejected,
}

/// Read-only view of whether a sync is in flight.
///
/// Cloning is cheap. Observers cannot affect the manager.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    receiver: watch::Receiver<bool>,
}

impl SyncStatus {
    /// Whether a sync attempt is in flight right now.
    pub fn current(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for the next change and return the new value.
    ///
    /// Returns `None` once the manager is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// A raw receiver, e.g. to bridge into a UI stream.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }
}

/// Coordinates sync runs.
///
/// Cheap to clone; clones control the same runs.
#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    context: WorkerContext,
    policy: RetryPolicy,
    task: TaskKind,
    state: Mutex<WorkerState>,
    state_tx: watch::Sender<WorkerState>,
    syncing_tx: watch::Sender<bool>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ManagerInner {
    /// Feed an event to the state machine and publish the result.
    fn apply(&self, event: Event) -> Vec<Action> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = state.clone();
        let (next, actions) = current.clone().on_event(event, &self.policy);
        tracing::trace!(from = ?current, to = ?next, ?event, "worker state");

        *state = next.clone();
        self.state_tx.send_replace(next);
        for action in &actions {
            if let Action::PublishSyncing(syncing) = action {
                self.syncing_tx.send_if_modified(|current| {
                    let changed = *current != *syncing;
                    *current = *syncing;
                    changed
                });
            }
        }
        actions
    }
}

impl SyncManager {
    /// Create a manager running `TaskKind::Sync` with the given retry policy.
    pub fn new(context: WorkerContext, policy: RetryPolicy) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::Idle);
        let (syncing_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(ManagerInner {
                context,
                policy,
                task: TaskKind::Sync,
                state: Mutex::new(WorkerState::Idle),
                state_tx,
                syncing_tx,
                driver: Mutex::new(None),
            }),
        }
    }

    /// App startup trigger.
    pub fn initialize(&self) -> SyncRequest {
        tracing::info!("requesting startup sync");
        self.request_sync()
    }

    /// Request a sync.
    ///
    /// Starts a run unless one is already in flight or waiting for a retry,
    /// in which case the request is coalesced into it.
    pub fn request_sync(&self) -> SyncRequest {
        // Held until the handle is stored so shutdown never misses a driver
        let mut driver = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.inner.context.cancel.is_cancelled() {
            tracing::debug!("sync requested after shutdown");
            return SyncRequest::Rejected;
        }

        let actions = self.inner.apply(Event::SyncRequested);
        if actions.contains(&Action::Coalesce) {
            tracing::debug!("sync already pending, request coalesced");
            return SyncRequest::Coalesced;
        }

        *driver = Some(tokio::spawn(drive(self.inner.clone())));
        SyncRequest::Started
    }

    /// Request a sync and wait until the run covering it is over.
    pub async fn sync_now(&self) -> WorkOutcome {
        if self.request_sync() == SyncRequest::Rejected {
            return WorkOutcome::Cancelled;
        }

        let mut states = self.inner.state_tx.subscribe();
        let outcome = match states.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.outcome().unwrap_or(WorkOutcome::Cancelled),
            Err(_) => WorkOutcome::Cancelled,
        };
        outcome
    }

    /// Observe whether a sync is in flight. Starts out `false`.
    pub fn is_syncing(&self) -> SyncStatus {
        SyncStatus {
            receiver: self.inner.syncing_tx.subscribe(),
        }
    }

    /// Snapshot of the worker state.
    pub fn state(&self) -> WorkerState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe worker state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<WorkerState> {
        self.inner.state_tx.subscribe()
    }

    /// Cancel any run in flight and wait for it to stop.
    ///
    /// Later requests are rejected. Changes committed before cancellation are
    /// kept.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down sync manager");
        self.inner.context.cancel.cancel();

        let handle = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                tracing::error!(%error, "sync driver task failed");
            }
        }
    }
}

/// Run attempts until the state machine stops asking for them.
async fn drive(inner: Arc<ManagerInner>) {
    let cancel = inner.context.cancel.clone();

    loop {
        let worker = inner.task.factory()(&inner.context);
        let event = match worker.do_work().await {
            Ok(WorkResult::Success) => Event::AttemptFinished { succeeded: true },
            Ok(WorkResult::Retry) => Event::AttemptFinished { succeeded: false },
            Err(Cancelled) => Event::Cancelled,
        };

        let mut retry = None;
        for action in inner.apply(event) {
            match action {
                Action::ScheduleRetry { attempt, delay } => retry = Some((attempt, delay)),
                Action::Complete(outcome) => tracing::info!(?outcome, "sync run complete"),
                _ => {}
            }
        }

        let Some((attempt, delay)) = retry else {
            return;
        };
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "sync failed, retrying");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                inner.apply(Event::Cancelled);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        let actions = inner.apply(Event::RetryTimerFired);
        if !actions
            .iter()
            .any(|action| matches!(action, Action::StartAttempt { .. }))
        {
            return;
        }
    }
}

/// Spawn a task requesting a sync every `period`.
///
/// The first request fires after one full period; startup sync is
/// [`SyncManager::initialize`]. Stops when the manager shuts down.
pub fn spawn_periodic_sync(manager: SyncManager, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "periodic sync started");

        let cancel = manager.inner.context.cancel.clone();
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        timer.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("periodic sync stopped");
                    return;
                }
                _ = timer.tick() => {
                    let request = manager.request_sync();
                    tracing::debug!(?request, "periodic sync trigger");
                }
            }
        }
    })
}
