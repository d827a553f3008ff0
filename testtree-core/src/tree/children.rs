// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::UpsertKey;
use testtree_metadata::ResultRecord;
use tracing::trace;

/// A leaf of the tree: exactly one result record and the key it is stored
/// under.
#[derive(Clone, Debug)]
pub struct ResultNode {
    key: UpsertKey,
    record: ResultRecord,
}

impl ResultNode {
    /// The key this node is sorted and matched by.
    #[inline]
    pub fn key(&self) -> &UpsertKey {
        &self.key
    }

    /// The most recently applied record for this node.
    #[inline]
    pub fn record(&self) -> &ResultRecord {
        &self.record
    }
}

/// The result of [`SortedSeriesChildren::upsert`].
#[derive(Clone, Debug)]
pub struct ChildUpsert {
    /// The position of the inserted or replaced node.
    pub index: usize,

    /// The record that was replaced, or `None` if a new node was inserted.
    pub replaced: Option<ResultRecord>,
}

impl ChildUpsert {
    /// Returns true if an existing node was replaced in place.
    #[inline]
    pub fn was_replace(&self) -> bool {
        self.replaced.is_some()
    }
}

/// The children of one series, kept sorted by [`UpsertKey`].
#[derive(Clone, Debug, Default)]
pub struct SortedSeriesChildren {
    nodes: Vec<ResultNode>,
}

impl SortedSeriesChildren {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record` under `key`, or replaces the record of the node that
    /// already has that key.
    ///
    /// A replacement keeps the node at its current position. An insertion
    /// goes before the first node whose key sorts after `key`, so the list
    /// stays sorted either way.
    pub fn upsert(&mut self, key: UpsertKey, record: ResultRecord) -> ChildUpsert {
        match self.nodes.binary_search_by(|node| node.key.cmp(&key)) {
            Ok(index) => {
                let previous = std::mem::replace(&mut self.nodes[index].record, record);
                trace!(%key, index, "replaced result node");
                ChildUpsert {
                    index,
                    replaced: Some(previous),
                }
            }
            Err(index) => {
                trace!(%key, index, "inserted result node");
                self.nodes.insert(index, ResultNode { key, record });
                ChildUpsert {
                    index,
                    replaced: None,
                }
            }
        }
    }

    /// Returns the node at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ResultNode> {
        self.nodes.get(index)
    }

    /// Looks up a node by key.
    pub fn find(&self, key: &UpsertKey) -> Option<(usize, &ResultNode)> {
        let index = self
            .nodes
            .binary_search_by(|node| node.key.cmp(key))
            .ok()?;
        Some((index, &self.nodes[index]))
    }

    /// Iterates over the nodes in sorted order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResultNode> {
        self.nodes.iter()
    }

    /// The number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if there are no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a SortedSeriesChildren {
    type Item = &'a ResultNode;
    type IntoIter = std::slice::Iter<'a, ResultNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::UpsertKeyMode;
    use proptest::prelude::*;
    use test_strategy::proptest;
    use testtree_metadata::ResultStatus;

    fn upsert(
        children: &mut SortedSeriesChildren,
        display_name: &str,
        status: ResultStatus,
    ) -> ChildUpsert {
        let record = ResultRecord::new("series", display_name, status);
        let key = UpsertKey::for_record(&record, UpsertKeyMode::DisplayName);
        children.upsert(key, record)
    }

    fn display_names(children: &SortedSeriesChildren) -> Vec<&str> {
        children.iter().map(|node| node.record().display_name()).collect()
    }

    #[test]
    fn insert_at_sorted_position() {
        let mut children = SortedSeriesChildren::new();

        let res = upsert(&mut children, "delta", ResultStatus::Successful);
        assert_eq!((res.index, res.was_replace()), (0, false));
        let res = upsert(&mut children, "Bravo", ResultStatus::Successful);
        assert_eq!((res.index, res.was_replace()), (0, false));
        let res = upsert(&mut children, "charlie", ResultStatus::Successful);
        assert_eq!((res.index, res.was_replace()), (1, false));
        let res = upsert(&mut children, "Echo", ResultStatus::Successful);
        assert_eq!((res.index, res.was_replace()), (3, false));

        assert_eq!(display_names(&children), ["Bravo", "charlie", "delta", "Echo"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut children = SortedSeriesChildren::new();
        upsert(&mut children, "alpha", ResultStatus::Successful);
        upsert(&mut children, "beta", ResultStatus::Successful);

        let res = upsert(&mut children, "BETA", ResultStatus::Failed);
        assert_eq!(res.index, 1);
        let previous = res.replaced.expect("existing node was replaced");
        assert_eq!(previous.display_name(), "beta");
        assert_eq!(previous.status(), ResultStatus::Successful);

        // The node now wraps the new record, including its display name.
        assert_eq!(display_names(&children), ["alpha", "BETA"]);
        assert_eq!(
            children.get(1).map(|node| node.record().status()),
            Some(ResultStatus::Failed)
        );
    }

    #[test]
    fn find_by_key() {
        let mut children = SortedSeriesChildren::new();
        upsert(&mut children, "one", ResultStatus::Successful);
        upsert(&mut children, "two", ResultStatus::Skipped);

        let lookup = ResultRecord::new("series", "TWO", ResultStatus::Other);
        let key = UpsertKey::for_record(&lookup, UpsertKeyMode::DisplayName);
        let (index, node) = children.find(&key).expect("node found");
        assert_eq!(index, 1);
        assert_eq!(node.record().status(), ResultStatus::Skipped);

        let lookup = ResultRecord::new("series", "three", ResultStatus::Other);
        let key = UpsertKey::for_record(&lookup, UpsertKeyMode::DisplayName);
        assert!(children.find(&key).is_none());
    }

    #[proptest]
    fn stays_sorted_and_unique(
        #[strategy(prop::collection::vec(("[a-dA-D]{0,3}", any::<ResultStatus>()), 0..64))]
        upserts: Vec<(String, ResultStatus)>,
    ) {
        let mut children = SortedSeriesChildren::new();
        for (display_name, status) in &upserts {
            let before = children.len();
            let res = upsert(&mut children, display_name, *status);
            let after = children.len();

            if res.was_replace() {
                prop_assert_eq!(before, after);
            } else {
                prop_assert_eq!(before + 1, after);
            }
            prop_assert_eq!(
                children.get(res.index).map(|node| node.record().display_name()),
                Some(display_name.as_str())
            );

            // Strictly ascending: sorted with no duplicate keys.
            for window in children.nodes.windows(2) {
                prop_assert!(
                    window[0].key() < window[1].key(),
                    "{} not before {}",
                    window[0].key(),
                    window[1].key()
                );
            }
        }
    }
}
