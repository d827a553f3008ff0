// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::Deserialize;
use smol_str::SmolStr;
use std::fmt;
use testtree_metadata::ResultRecord;

/// How records are matched to existing entries in a series.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpsertKeyMode {
    /// Match on the display name, ignoring case.
    ///
    /// Two different checks that share a display name within one series are
    /// folded into a single entry holding whichever result arrived last.
    #[default]
    DisplayName,

    /// Match on the display name ignoring case, then on the record's unique
    /// ID.
    ///
    /// Records without a unique ID behave as in
    /// [`DisplayName`](Self::DisplayName) mode among themselves.
    DisplayNameAndId,
}

/// The key that identifies an entry in the tree.
///
/// Ordering is lexicographic over `(series, folded display name, unique ID)`.
/// Within a series only the latter two ever differ, so the children of a
/// series sort by display name ignoring case.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct UpsertKey {
    series: SmolStr,
    folded_display_name: SmolStr,
    unique_id: Option<SmolStr>,
}

impl UpsertKey {
    /// Computes the key for `record` under `mode`.
    pub fn for_record(record: &ResultRecord, mode: UpsertKeyMode) -> Self {
        let unique_id = match mode {
            UpsertKeyMode::DisplayName => None,
            UpsertKeyMode::DisplayNameAndId => record.unique_id().map(SmolStr::new),
        };
        Self {
            series: record.series_name().into(),
            folded_display_name: fold_case(record.display_name()),
            unique_id,
        }
    }

    /// The exact (case-sensitive) series name.
    #[inline]
    pub fn series(&self) -> &str {
        &self.series
    }

    /// The display name, folded to lowercase.
    #[inline]
    pub fn folded_display_name(&self) -> &str {
        &self.folded_display_name
    }

    /// The unique ID, if it participates in this key.
    #[inline]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }
}

impl fmt::Display for UpsertKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.series, self.folded_display_name)?;
        if let Some(unique_id) = &self.unique_id {
            write!(f, " ({unique_id})")?;
        }
        Ok(())
    }
}

fn fold_case(s: &str) -> SmolStr {
    // Avoid allocating for the common all-lowercase ASCII case.
    if s.bytes().any(|b| b.is_ascii_uppercase()) || !s.is_ascii() {
        SmolStr::new(s.to_lowercase())
    } else {
        SmolStr::new(s)
    }
}
