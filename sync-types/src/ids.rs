//! Collection identity and change-list ordering types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A data collection that is synchronized with the remote service.
///
/// The string form doubles as the path segment of the remote API
/// (`/changelists/topics`, `/newsresources?id=...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Followable topics.
    Topics,
    /// News resources (articles, videos, ...).
    #[serde(rename = "newsresources")]
    NewsResources,
}

impl CollectionKind {
    /// Every synced collection, in sync order.
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Topics, CollectionKind::NewsResources];

    /// Stable string name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Topics => "topics",
            CollectionKind::NewsResources => "newsresources",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topics" => Ok(CollectionKind::Topics),
            "newsresources" | "news" => Ok(CollectionKind::NewsResources),
            other => Err(TypesError::UnknownCollection(other.to_string())),
        }
    }
}

/// A change-list version assigned by the remote service.
///
/// Versions only ever grow on the server side. Locally, `-1` marks a
/// collection that has never been synced.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// The version of a collection that has never been synced.
    pub const NEVER_SYNCED: Version = Version(-1);

    /// Create a new Version with the given value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this Version.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether at least one change list has been applied.
    pub fn is_synced(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::NEVER_SYNCED
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self.0)
    }
}
