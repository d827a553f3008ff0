// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::RunSummary;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use testtree_metadata::ResultRecord;

/// An owned copy of a tree's contents.
///
/// Unlike the tree itself, a snapshot is not confined to the mutator thread
/// and can be sent anywhere, for example to print a final report once a run
/// is over.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TreeSnapshot {
    /// Series in the order they were created.
    pub series: Vec<SeriesSnapshot>,

    /// Counts by status.
    pub summary: RunSummary,
}

impl TreeSnapshot {
    /// Looks up a series by exact name.
    pub fn series_named(&self, name: &str) -> Option<&SeriesSnapshot> {
        self.series.iter().find(|series| series.name == name)
    }
}

/// An owned copy of one series.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SeriesSnapshot {
    /// The name of the series.
    pub name: SmolStr,

    /// The records in the series, in sorted order.
    pub entries: Vec<ResultRecord>,
}

impl SeriesSnapshot {
    /// Returns the display names of the entries, in order.
    pub fn display_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(ResultRecord::display_name)
            .collect()
    }
}
