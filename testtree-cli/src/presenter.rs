// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Printing a finished tree.
//!
//! Expansion state is built up from tree events while the run is in progress,
//! then used to decide which parts of the final snapshot are shown.

use itertools::Itertools;
use owo_colors::{OwoColorize, Style, style};
use std::collections::HashSet;
use swrite::{SWrite, swrite, swriteln};
use testtree_core::{
    events::{TreeEvent, TreeEventKind},
    selection::NodeHandle,
    tree::{RunSummary, SeriesSnapshot, TreeSnapshot},
};
use testtree_metadata::{ResultRecord, ResultStatus};
use tracing::debug;

/// Which nodes a viewer of the tree would currently see expanded.
///
/// Nothing starts out expanded. The root opens when the first series appears
/// (if the tree signals it) and a series opens, along with the root, when one
/// of its results is revealed. Nodes never collapse again.
#[derive(Clone, Debug, Default)]
pub(crate) struct ExpansionState {
    expanded: HashSet<NodeHandle>,
}

impl ExpansionState {
    pub(crate) fn observe(&mut self, event: &TreeEvent) {
        match &event.kind {
            TreeEventKind::FirstContent { .. } => {
                self.expanded.insert(NodeHandle::Root);
            }
            TreeEventKind::Reveal { path } => {
                for handle in path.handles() {
                    if self.expanded.insert(handle) {
                        debug!(?handle, sequence = event.sequence, "expanded node");
                    }
                }
            }
            TreeEventKind::SeriesInserted { .. }
            | TreeEventKind::EntryInserted { .. }
            | TreeEventKind::EntryReplaced { .. } => {}
        }
    }

    pub(crate) fn is_expanded(&self, handle: NodeHandle) -> bool {
        self.expanded.contains(&handle)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    series: Style,
    count: Style,
    successful: Style,
    failed: Style,
    skipped: Style,
    duration: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.series = style().bold();
        self.count = style().bold();
        self.successful = style().green().bold();
        self.failed = style().red().bold();
        self.skipped = style().yellow().bold();
        self.duration = style().dimmed();
    }

    fn status(&self, status: ResultStatus) -> Style {
        match status {
            ResultStatus::Successful => self.successful,
            ResultStatus::Failed | ResultStatus::Aborted | ResultStatus::Other => self.failed,
            ResultStatus::Skipped => self.skipped,
        }
    }
}

const EXPANDED_MARKER: &str = "v";
const COLLAPSED_MARKER: &str = ">";

/// Renders a [`TreeSnapshot`] as indented text.
#[derive(Debug)]
pub(crate) struct TreePresenter<'a> {
    styles: &'a Styles,
    expansion: &'a ExpansionState,
    verbose: bool,
}

impl<'a> TreePresenter<'a> {
    pub(crate) fn new(styles: &'a Styles, expansion: &'a ExpansionState, verbose: bool) -> Self {
        Self {
            styles,
            expansion,
            verbose,
        }
    }

    /// Writes the tree followed by a summary line.
    pub(crate) fn write_tree(&self, snapshot: &TreeSnapshot, out: &mut String) {
        if self.is_expanded(NodeHandle::Root) {
            for (series_index, series) in snapshot.series.iter().enumerate() {
                self.write_series(series_index, series, out);
            }
        } else if !snapshot.series.is_empty() {
            swriteln!(
                out,
                "{COLLAPSED_MARKER} {} series",
                snapshot.series.len().style(self.styles.count)
            );
        }

        self.write_summary(&snapshot.summary, out);
    }

    fn write_series(&self, series_index: usize, series: &SeriesSnapshot, out: &mut String) {
        let name = if series.name.is_empty() {
            "(unnamed)"
        } else {
            series.name.as_str()
        };

        if self.is_expanded(NodeHandle::Series { series_index }) {
            swriteln!(out, "{EXPANDED_MARKER} {}", name.style(self.styles.series));
            for record in &series.entries {
                self.write_entry(record, out);
            }
        } else {
            swriteln!(
                out,
                "{COLLAPSED_MARKER} {} ({})",
                name.style(self.styles.series),
                plural(series.entries.len(), "entry", "entries"),
            );
        }
    }

    fn write_entry(&self, record: &ResultRecord, out: &mut String) {
        let status = record.status();
        let label = format!("{:>5}", status_label(status));
        swrite!(out, "    {}", label.style(self.styles.status(status)));

        let payload = record.payload();
        if let Some(duration) = payload.duration {
            let duration = format!("[{:>8.3}s]", duration.as_secs_f64());
            swrite!(out, " {}", duration.style(self.styles.duration));
        }
        swriteln!(out, " {}", record.display_name());

        if self.verbose {
            if let Some(message) = &payload.message {
                for line in message.lines() {
                    swriteln!(out, "          {line}");
                }
            }
        }
    }

    fn write_summary(&self, summary: &RunSummary, out: &mut String) {
        let counts = ResultStatus::ALL
            .iter()
            .filter(|status| summary.count(**status) > 0)
            .map(|status| {
                let count = summary.count(*status);
                format!(
                    "{} {}",
                    count.style(self.styles.status(*status)),
                    status.as_str()
                )
            })
            .join(", ");

        swrite!(
            out,
            "{} in {}",
            plural(summary.entry_count(), "entry", "entries").style(self.styles.count),
            plural(summary.series_count, "series", "series"),
        );
        if !counts.is_empty() {
            swrite!(out, ": {counts}");
        }
        swriteln!(
            out,
            " ({} applied)",
            plural(summary.applied_count, "record", "records")
        );
    }

    fn is_expanded(&self, handle: NodeHandle) -> bool {
        self.verbose || self.expansion.is_expanded(handle)
    }
}

fn status_label(status: ResultStatus) -> &'static str {
    match status {
        ResultStatus::Successful => "PASS",
        ResultStatus::Failed => "FAIL",
        ResultStatus::Aborted => "ABORT",
        ResultStatus::Skipped => "SKIP",
        ResultStatus::Other => "OTHER",
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}
