// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::SortedSeriesChildren;
use crate::events::TreeEventKind;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

/// A named group of results directly under the root.
#[derive(Clone, Debug)]
pub struct SeriesNode {
    name: SmolStr,
    children: SortedSeriesChildren,
}

impl SeriesNode {
    fn new(name: SmolStr) -> Self {
        Self {
            name,
            children: SortedSeriesChildren::new(),
        }
    }

    /// The name of the series. Never changes once the series is created.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The results in this series, sorted by display name ignoring case.
    #[inline]
    pub fn children(&self) -> &SortedSeriesChildren {
        &self.children
    }

    #[inline]
    pub(super) fn children_mut(&mut self) -> &mut SortedSeriesChildren {
        &mut self.children
    }
}

/// The series under the root, in the order they were first seen.
///
/// Series are matched by exact, case-sensitive name. Once created a series
/// keeps its position for the rest of the run.
#[derive(Clone, Debug)]
pub struct SeriesIndex {
    series: IndexMap<SmolStr, SeriesNode>,
    signal_first_content: bool,
}

impl SeriesIndex {
    /// Creates an empty index.
    ///
    /// If `signal_first_content` is true, creating the first series also emits
    /// [`TreeEventKind::FirstContent`].
    pub fn new(signal_first_content: bool) -> Self {
        Self {
            series: IndexMap::new(),
            signal_first_content,
        }
    }

    /// Returns the position of the series called `name`, appending a new empty
    /// series if there isn't one.
    ///
    /// Creation is reported through `emit`.
    pub fn find_or_create<F>(&mut self, name: &str, mut emit: F) -> usize
    where
        F: FnMut(TreeEventKind),
    {
        if let Some(index) = self.series.get_index_of(name) {
            return index;
        }

        let name = SmolStr::new(name);
        let (series_index, _) = self
            .series
            .insert_full(name.clone(), SeriesNode::new(name.clone()));
        debug!(series = %name, series_index, "created series");

        emit(TreeEventKind::SeriesInserted {
            series_name: name.clone(),
            series_index,
        });
        if series_index == 0 && self.signal_first_content {
            emit(TreeEventKind::FirstContent { series_name: name });
        }

        series_index
    }

    /// Returns the series at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&SeriesNode> {
        self.series.get_index(index).map(|(_, series)| series)
    }

    #[inline]
    pub(super) fn get_mut(&mut self, index: usize) -> Option<&mut SeriesNode> {
        self.series.get_index_mut(index).map(|(_, series)| series)
    }

    /// Looks up a series by exact name, returning its position as well.
    pub fn get_by_name(&self, name: &str) -> Option<(usize, &SeriesNode)> {
        self.series
            .get_full(name)
            .map(|(index, _, series)| (index, series))
    }

    /// Iterates over the series in the order they were created.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SeriesNode> + '_ {
        self.series.values()
    }

    /// The number of series.
    #[inline]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if no series have been created.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
