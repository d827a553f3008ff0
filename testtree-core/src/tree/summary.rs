// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use testtree_metadata::ResultStatus;

/// Counts of the entries currently in a tree, by status.
///
/// The counts describe the tree as it is now, not every record ever applied:
/// when a record replaces another, the old status is no longer counted.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunSummary {
    /// The number of series.
    pub series_count: usize,

    /// The total number of records applied, including replacements.
    pub applied_count: usize,

    /// The number of entries that succeeded.
    pub successful: usize,

    /// The number of entries that failed.
    pub failed: usize,

    /// The number of entries that were aborted.
    pub aborted: usize,

    /// The number of entries that were skipped.
    pub skipped: usize,

    /// The number of entries with some other status.
    pub other: usize,
}

impl RunSummary {
    /// The number of entries in the tree.
    pub fn entry_count(&self) -> usize {
        self.successful + self.failed + self.aborted + self.skipped + self.other
    }

    /// Returns the number of entries with the given status.
    pub fn count(&self, status: ResultStatus) -> usize {
        match status {
            ResultStatus::Successful => self.successful,
            ResultStatus::Failed => self.failed,
            ResultStatus::Aborted => self.aborted,
            ResultStatus::Skipped => self.skipped,
            ResultStatus::Other => self.other,
        }
    }

    /// Returns true if any entry has a status that fails a run.
    pub fn any_failed(&self) -> bool {
        self.failed > 0 || self.aborted > 0 || self.other > 0
    }

    /// Returns true if the tree has entries and none of them failed.
    pub fn is_success(&self) -> bool {
        self.entry_count() > 0 && !self.any_failed()
    }

    pub(super) fn on_series_created(&mut self) {
        self.series_count += 1;
    }

    pub(super) fn on_inserted(&mut self, status: ResultStatus) {
        self.applied_count += 1;
        *self.count_mut(status) += 1;
    }

    pub(super) fn on_replaced(&mut self, previous: ResultStatus, status: ResultStatus) {
        self.applied_count += 1;
        *self.count_mut(previous) -= 1;
        *self.count_mut(status) += 1;
    }

    fn count_mut(&mut self, status: ResultStatus) -> &mut usize {
        match status {
            ResultStatus::Successful => &mut self.successful,
            ResultStatus::Failed => &mut self.failed,
            ResultStatus::Aborted => &mut self.aborted,
            ResultStatus::Skipped => &mut self.skipped,
            ResultStatus::Other => &mut self.other,
        }
    }
}
