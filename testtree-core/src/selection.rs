// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolving selected positions in the tree back to result records.
//!
//! A presenter that lets users pick a node hands back a [`NodeHandle`]. Only
//! entries hold records: the root and series headers resolve to nothing.

use crate::tree::{ResultTree, UpsertKey, UpsertOutcome};
use testtree_metadata::ResultRecord;

/// A position in the tree.
///
/// Handles are positional. Inserting an entry into a series shifts the
/// entries after it, so a handle to an entry refers to whatever is at that
/// position now. Presenters that hold on to handles should update them on
/// [`EntryInserted`](crate::events::TreeEventKind::EntryInserted) events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeHandle {
    /// The root of the tree.
    Root,

    /// A series header.
    Series {
        /// The position of the series under the root.
        series_index: usize,
    },

    /// A result entry.
    Entry {
        /// The position of the series under the root.
        series_index: usize,

        /// The position of the entry within the series.
        index: usize,
    },
}

impl From<UpsertOutcome> for NodeHandle {
    fn from(outcome: UpsertOutcome) -> Self {
        Self::Entry {
            series_index: outcome.series_index,
            index: outcome.index,
        }
    }
}

impl ResultTree {
    /// Returns the record at `handle`, or `None` if the handle points to the
    /// root, a series header, or a position that doesn't exist.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn resolve(&self, handle: NodeHandle) -> Option<&ResultRecord> {
        self.assert_confined("ResultTree::resolve");
        match handle {
            NodeHandle::Root | NodeHandle::Series { .. } => None,
            NodeHandle::Entry {
                series_index,
                index,
            } => self
                .series()
                .get(series_index)?
                .children()
                .get(index)
                .map(|node| node.record()),
        }
    }

    /// Returns the handle of the entry that `record` would be matched to, if
    /// the tree has one.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn handle_for(&self, record: &ResultRecord) -> Option<NodeHandle> {
        let (series_index, series) = self.series().get_by_name(record.series_name())?;
        let key = UpsertKey::for_record(record, self.key_mode());
        let (index, _) = series.children().find(&key)?;
        Some(NodeHandle::Entry {
            series_index,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use test_case::test_case;
    use testtree_metadata::ResultStatus;

    fn populated_tree() -> ResultTree {
        let mut tree = ResultTree::new(&TreeConfig::default());
        for (series, name, status) in [
            ("math", "adds", ResultStatus::Successful),
            ("math", "Divides", ResultStatus::Failed),
            ("io", "reads", ResultStatus::Skipped),
        ] {
            tree.upsert(ResultRecord::new(series, name, status), |_| {});
        }
        tree
    }

    #[test_case(NodeHandle::Root ; "root")]
    #[test_case(NodeHandle::Series { series_index: 0 } ; "series header")]
    #[test_case(NodeHandle::Series { series_index: 7 } ; "missing series header")]
    #[test_case(NodeHandle::Entry { series_index: 0, index: 2 } ; "past the end")]
    #[test_case(NodeHandle::Entry { series_index: 2, index: 0 } ; "missing series")]
    fn resolves_to_no_record(handle: NodeHandle) {
        assert_eq!(populated_tree().resolve(handle), None);
    }

    #[test]
    fn resolves_entries() {
        let tree = populated_tree();
        let record = tree
            .resolve(NodeHandle::Entry {
                series_index: 0,
                index: 1,
            })
            .expect("entry exists");
        assert_eq!(record.display_name(), "Divides");
        assert_eq!(record.status(), ResultStatus::Failed);
    }

    #[test]
    fn handle_round_trips_through_upsert_outcome() {
        let mut tree = populated_tree();
        let record = ResultRecord::new("io", "writes", ResultStatus::Successful);
        let outcome = tree.upsert(record.clone(), |_| {});

        let handle = NodeHandle::from(outcome);
        assert_eq!(tree.handle_for(&record), Some(handle));
        assert_eq!(tree.resolve(handle), Some(&record));

        let unknown = ResultRecord::new("io", "deletes", ResultStatus::Successful);
        assert_eq!(tree.handle_for(&unknown), None);
    }
}
