// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifications emitted as the tree changes.
//!
//! Events are produced by a [`ResultTree`](crate::tree::ResultTree) on its
//! mutator thread and handed to an observer callback on that same thread. They
//! describe what changed, not how to present it: whether a revealed series is
//! expanded, scrolled to, or ignored is up to the observer.

use crate::selection::NodeHandle;
use smol_str::SmolStr;
use testtree_metadata::ResultStatus;

/// A change to the tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeEvent {
    /// The zero-based index of the upsert that produced this event.
    ///
    /// All events from one upsert share a sequence number, and sequence
    /// numbers follow the order records were applied in.
    pub sequence: u64,

    /// The kind of change.
    pub kind: TreeEventKind,
}

/// The kind of change a [`TreeEvent`] describes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TreeEventKind {
    /// A new series was appended under the root.
    SeriesInserted {
        /// The name of the series.
        series_name: SmolStr,

        /// The position of the series under the root.
        series_index: usize,
    },

    /// The first series of the run was created, so the root is no longer
    /// empty.
    ///
    /// Always preceded by the [`SeriesInserted`](Self::SeriesInserted) event
    /// for the same series.
    FirstContent {
        /// The name of the first series.
        series_name: SmolStr,
    },

    /// A new entry was inserted into a series.
    EntryInserted {
        /// The name of the series.
        series_name: SmolStr,

        /// The display name of the new entry.
        display_name: SmolStr,

        /// The position of the series under the root.
        series_index: usize,

        /// The position of the entry within the series. Entries previously at
        /// this position or later have shifted up by one.
        index: usize,

        /// The status of the new entry.
        status: ResultStatus,
    },

    /// The record held by an existing entry was replaced. The entry did not
    /// move.
    EntryReplaced {
        /// The name of the series.
        series_name: SmolStr,

        /// The display name of the new record.
        display_name: SmolStr,

        /// The position of the series under the root.
        series_index: usize,

        /// The position of the entry within the series.
        index: usize,

        /// The status of the record that was replaced.
        previous_status: ResultStatus,

        /// The status of the new record.
        status: ResultStatus,
    },

    /// A non-successful result arrived: the path to its series should be made
    /// visible.
    Reveal {
        /// The path from the root to the series.
        path: SeriesPath,
    },
}

impl TreeEventKind {
    /// Returns the series this event concerns.
    pub fn series_name(&self) -> &str {
        match self {
            Self::SeriesInserted { series_name, .. }
            | Self::FirstContent { series_name }
            | Self::EntryInserted { series_name, .. }
            | Self::EntryReplaced { series_name, .. } => series_name,
            Self::Reveal { path } => path.series_name(),
        }
    }
}

/// The path from the root to a series.
///
/// The tree only has one level of series, so the path is the series itself.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SeriesPath {
    series_index: usize,
    series_name: SmolStr,
}

impl SeriesPath {
    pub(crate) fn new(series_index: usize, series_name: SmolStr) -> Self {
        Self {
            series_index,
            series_name,
        }
    }

    /// The position of the series under the root.
    #[inline]
    pub fn series_index(&self) -> usize {
        self.series_index
    }

    /// The name of the series.
    #[inline]
    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    /// Returns the handles along this path, starting at the root.
    pub fn handles(&self) -> [NodeHandle; 2] {
        [
            NodeHandle::Root,
            NodeHandle::Series {
                series_index: self.series_index,
            },
        ]
    }
}
