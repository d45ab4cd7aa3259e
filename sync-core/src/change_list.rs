//! Change-list planning for feedsync.
//!
//! A change list is the ordered list of `(id, version, is_delete)` rows that
//! changed in a remote collection after a version cursor. Planning splits it
//! into the ids to delete and the ids to fetch and upsert, and computes the
//! version watermark to persist once both have been applied.

use sync_types::{ChangeListEntry, Version};

/// What one reconciliation pass has to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeListPlan {
    /// Ids deleted server-side, in change-list order.
    pub deleted_ids: Vec<String>,
    /// Ids added or updated server-side, in change-list order.
    pub updated_ids: Vec<String>,
    /// Version to persist after the deletes and upserts committed.
    pub latest_version: Version,
}

impl ChangeListPlan {
    /// Plan a pass from the current watermark and a fetched change list.
    ///
    /// Returns `None` for an empty change list: nothing to apply and the
    /// watermark stays where it is.
    ///
    /// The list is expected in ascending version order, so the last entry
    /// carries the new watermark. The watermark never moves backwards.
    pub fn from_entries(current: Version, entries: &[ChangeListEntry]) -> Option<Self> {
        let last = entries.last()?;

        let (deleted, updated): (Vec<&ChangeListEntry>, Vec<&ChangeListEntry>) =
            entries.iter().partition(|entry| entry.is_delete);

        Some(Self {
            deleted_ids: deleted.into_iter().map(|e| e.id.clone()).collect(),
            updated_ids: updated.into_iter().map(|e| e.id.clone()).collect(),
            latest_version: current.max(last.version),
        })
    }

    /// Total number of entries covered by this plan.
    pub fn len(&self) -> usize {
        self.deleted_ids.len() + self.updated_ids.len()
    }

    /// Whether the plan has nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check that a change list is sorted ascending by version.
pub fn is_ascending(entries: &[ChangeListEntry]) -> bool {
    entries.windows(2).all(|pair| pair[0].version <= pair[1].version)
}
