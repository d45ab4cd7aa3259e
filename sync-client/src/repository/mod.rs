//! Offline-first repositories.
//!
//! Each repository serves UI reads from local storage only and implements
//! [`Syncable`](crate::Syncable) to pull remote changes of its collection into
//! that storage.

mod news;
mod topics;

pub use news::OfflineFirstNewsRepository;
pub use topics::OfflineFirstTopicsRepository;
