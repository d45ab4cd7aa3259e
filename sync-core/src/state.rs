//! Sync orchestrator state machine for feedsync.
//!
//! This module provides a pure, side-effect-free state machine for the sync
//! worker lifecycle. The state machine takes events as input and produces
//! a new state plus a list of actions to execute.
//!
//! The actual I/O (running collection syncs, sleeping, publishing status) is
//! performed by sync-client, not by this module.
//!
//! Only one run exists at a time: a sync request while a run is in flight or
//! waiting for its retry is coalesced into that run.

use std::time::Duration;

use crate::RetryPolicy;

/// Orchestrator state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    /// No sync has been requested yet.
    Idle,
    /// A sync attempt is in flight.
    Running {
        /// Attempt number within the current run (1-based).
        attempt: u32,
    },
    /// The last run completed successfully.
    Succeeded,
    /// The last attempt failed.
    Failed {
        /// Attempt number that failed.
        attempt: u32,
        /// Whether another attempt is scheduled.
        retry_pending: bool,
    },
}

impl WorkerState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (sync-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(self, event: Event, policy: &RetryPolicy) -> (Self, Vec<Action>) {
        match (self, event) {
            // Start a fresh run when nothing is pending
            (Self::Idle, Event::SyncRequested)
            | (Self::Succeeded, Event::SyncRequested)
            | (
                Self::Failed {
                    retry_pending: false,
                    ..
                },
                Event::SyncRequested,
            ) => (Self::Running { attempt: 1 }, start_attempt(1)),

            // Unique work: keep the existing run
            (state @ Self::Running { .. }, Event::SyncRequested)
            | (
                state @ Self::Failed {
                    retry_pending: true,
                    ..
                },
                Event::SyncRequested,
            ) => (state, vec![Action::Coalesce]),

            // From Running
            (Self::Running { .. }, Event::AttemptFinished { succeeded: true }) => (
                Self::Succeeded,
                vec![
                    Action::PublishSyncing(false),
                    Action::Complete(WorkOutcome::Success),
                ],
            ),
            (Self::Running { attempt }, Event::AttemptFinished { succeeded: false }) => {
                if policy.should_retry(attempt) {
                    (
                        Self::Failed {
                            attempt,
                            retry_pending: true,
                        },
                        vec![
                            Action::PublishSyncing(false),
                            Action::ScheduleRetry {
                                attempt: attempt.saturating_add(1),
                                delay: policy.delay_for(attempt),
                            },
                        ],
                    )
                } else {
                    (
                        Self::Failed {
                            attempt,
                            retry_pending: false,
                        },
                        vec![
                            Action::PublishSyncing(false),
                            Action::Complete(WorkOutcome::Failure),
                        ],
                    )
                }
            }

            // From a failed attempt waiting for its retry
            (
                Self::Failed {
                    attempt,
                    retry_pending: true,
                },
                Event::RetryTimerFired,
            ) => {
                let next = attempt.saturating_add(1);
                (Self::Running { attempt: next }, start_attempt(next))
            }

            // Cancellation tears the run down without a retry
            (Self::Running { .. }, Event::Cancelled)
            | (
                Self::Failed {
                    retry_pending: true,
                    ..
                },
                Event::Cancelled,
            ) => (
                Self::Idle,
                vec![
                    Action::PublishSyncing(false),
                    Action::Complete(WorkOutcome::Cancelled),
                ],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if an attempt is in flight.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Check if a run is in flight or waiting for a retry.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::Running { .. }
                | Self::Failed {
                    retry_pending: true,
                    ..
                }
        )
    }

    /// Outcome of the last finished run, if the machine is at rest.
    pub fn outcome(&self) -> Option<WorkOutcome> {
        match self {
            Self::Succeeded => Some(WorkOutcome::Success),
            Self::Failed {
                retry_pending: false,
                ..
            } => Some(WorkOutcome::Failure),
            _ => None,
        }
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::new()
    }
}

fn start_attempt(attempt: u32) -> Vec<Action> {
    vec![
        Action::PublishSyncing(true),
        Action::StartAttempt { attempt },
    ]
}

/// Events that can occur in the sync lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A trigger (startup, periodic, push message) asked for a sync.
    SyncRequested,
    /// A sync attempt finished.
    AttemptFinished {
        /// Whether every collection synced and post-processing succeeded.
        succeeded: bool,
    },
    /// The retry backoff elapsed.
    RetryTimerFired,
    /// The run was cancelled (shutdown).
    Cancelled,
}

/// Final result of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOutcome {
    /// All collections synced.
    Success,
    /// Attempts exhausted without success.
    Failure,
    /// The run was cancelled before finishing.
    Cancelled,
}

/// Actions to be executed by the sync-client.
///
/// These are instructions, not side effects. The sync-client interprets
/// these and performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Publish the "is syncing" status.
    PublishSyncing(bool),
    /// Run one sync attempt.
    StartAttempt {
        /// Attempt number (1-based).
        attempt: u32,
    },
    /// Start a timer for the next attempt.
    ScheduleRetry {
        /// Attempt number that will run when the timer fires.
        attempt: u32,
        /// Delay before the retry.
        delay: Duration,
    },
    /// The request was folded into the pending run.
    Coalesce,
    /// The run reached its final outcome.
    Complete(WorkOutcome),
}
