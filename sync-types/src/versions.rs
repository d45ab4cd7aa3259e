//! ChangeListVersions - the persisted per-collection version record.

use serde::{Deserialize, Serialize};

use crate::{CollectionKind, Version};

/// Summary of the local version of each collection for sync.
///
/// Created with every version at [`Version::NEVER_SYNCED`] on first run and
/// only ever advanced after a collection's changes have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeListVersions {
    /// Last applied topics change-list version
    #[serde(default)]
    pub topic_version: Version,
    /// Last applied news resources change-list version
    #[serde(default)]
    pub news_resource_version: Version,
}

impl ChangeListVersions {
    /// Record for a store that has never synced.
    pub fn new() -> Self {
        Self {
            topic_version: Version::NEVER_SYNCED,
            news_resource_version: Version::NEVER_SYNCED,
        }
    }

    /// Version of the given collection.
    pub fn get(&self, kind: CollectionKind) -> Version {
        match kind {
            CollectionKind::Topics => self.topic_version,
            CollectionKind::NewsResources => self.news_resource_version,
        }
    }

    /// Copy of this record with one collection's version replaced.
    pub fn with(mut self, kind: CollectionKind, version: Version) -> Self {
        match kind {
            CollectionKind::Topics => self.topic_version = version,
            CollectionKind::NewsResources => self.news_resource_version = version,
        }
        self
    }
}

impl Default for ChangeListVersions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_never_synced() {
        let versions = ChangeListVersions::default();
        for kind in CollectionKind::ALL {
            assert_eq!(versions.get(kind), Version::NEVER_SYNCED);
        }
    }

    #[test]
    fn with_only_touches_one_collection() {
        let versions = ChangeListVersions::new().with(CollectionKind::Topics, Version::new(7));
        assert_eq!(versions.topic_version, Version::new(7));
        assert_eq!(versions.news_resource_version, Version::NEVER_SYNCED);
    }

    #[test]
    fn missing_fields_default_to_never_synced() {
        let versions: ChangeListVersions = serde_json::from_str(r#"{"topicVersion":3}"#).unwrap();
        assert_eq!(versions.topic_version, Version::new(3));
        assert_eq!(versions.news_resource_version, Version::NEVER_SYNCED);
    }
}
