//! # sync-core
//!
//! Pure logic for feedsync (no I/O, instant tests).
//!
//! This crate implements the decisions of the sync engine without any
//! network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`ChangeListPlan`] turns a fetched change list into deletes, upserts and
//!   the next version watermark
//! - [`WorkerState`] is the orchestrator state machine (events in, actions out)
//! - [`RetryPolicy`] computes the backoff between failed sync attempts
//!
//! The actual I/O (network, storage, timers) is performed by `sync-client`,
//! which interprets the plans and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod change_list;
pub mod state;

pub use backoff::RetryPolicy;
pub use change_list::{is_ascending, ChangeListPlan};
pub use state::{Action, Event, WorkOutcome, WorkerState};
