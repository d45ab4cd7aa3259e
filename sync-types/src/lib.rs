//! # sync-types
//!
//! Data model and wire types for the feedsync change-list protocol.
//!
//! This crate provides the foundational types used across all feedsync crates:
//! - [`CollectionKind`], [`Version`] - Collection identity and change-list ordering
//! - [`ChangeListEntry`] - One row of a remote change list
//! - [`ChangeListVersions`] - The persisted per-collection version watermarks
//! - [`Topic`], [`NewsResource`], [`Entity`] - Synced domain records
//! - [`NetworkResponse`] - JSON envelope of every remote response
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod models;
mod response;
mod versions;

pub use error::TypesError;
pub use ids::{CollectionKind, Version};
pub use models::{ChangeListEntry, Entity, NewsResource, Topic};
pub use response::NetworkResponse;
pub use versions::ChangeListVersions;
