// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    RunSummary, SeriesIndex, SeriesNode, SeriesSnapshot, TreeSnapshot, UpsertKey, UpsertKeyMode,
};
use crate::{
    config::TreeConfig,
    errors::ConfinementViolation,
    events::{SeriesPath, TreeEvent, TreeEventKind},
};
use smol_str::SmolStr;
use std::thread::{self, ThreadId};
use testtree_metadata::ResultRecord;
use tracing::debug;

/// What a call to [`ResultTree::upsert`] did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UpsertOutcome {
    /// The position of the series under the root.
    pub series_index: usize,

    /// The position of the entry within its series.
    pub index: usize,

    /// True if an existing entry was replaced, false if a new one was
    /// inserted.
    pub was_replace: bool,
}

/// The aggregation tree: series under an implicit root, and sorted results
/// under each series.
///
/// A tree is confined to the thread that created it (its mutator thread).
/// Every method that reads or writes the structure checks this and panics
/// with a [`ConfinementViolation`] if called from anywhere else. Use a
/// [`ConfinementDispatcher`](crate::dispatcher::ConfinementDispatcher) to feed
/// records in from other threads.
#[derive(Debug)]
pub struct ResultTree {
    owner: ThreadId,
    key_mode: UpsertKeyMode,
    series: SeriesIndex,
    summary: RunSummary,
    sequence: u64,
}

impl ResultTree {
    /// Creates an empty tree confined to the current thread.
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            owner: thread::current().id(),
            key_mode: config.upsert_key,
            series: SeriesIndex::new(config.reveal_first_series),
            summary: RunSummary::default(),
            sequence: 0,
        }
    }

    /// Applies `record` to the tree.
    ///
    /// Finds or creates the record's series, then inserts the record into the
    /// series at its sorted position or replaces the entry with the same key.
    /// Every resulting change is passed to `callback` as it happens. A record
    /// with a non-successful status also produces a
    /// [`Reveal`](TreeEventKind::Reveal) event for its series.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn upsert<F>(&mut self, record: ResultRecord, mut callback: F) -> UpsertOutcome
    where
        F: FnMut(TreeEvent),
    {
        self.assert_confined("ResultTree::upsert");

        let sequence = self.sequence;
        self.sequence += 1;
        let mut emit = |kind: TreeEventKind| callback(TreeEvent { sequence, kind });

        let series_count = self.series.len();
        let series_index = self.series.find_or_create(record.series_name(), &mut emit);
        if self.series.len() > series_count {
            self.summary.on_series_created();
        }

        let series_name = SmolStr::new(record.series_name());
        let display_name = SmolStr::new(record.display_name());
        let status = record.status();
        let key = UpsertKey::for_record(&record, self.key_mode);

        let children = self
            .series
            .get_mut(series_index)
            .expect("series index was just returned by find_or_create")
            .children_mut();
        let res = children.upsert(key, record);

        match &res.replaced {
            Some(previous) => {
                let previous_status = previous.status();
                self.summary.on_replaced(previous_status, status);
                emit(TreeEventKind::EntryReplaced {
                    series_name: series_name.clone(),
                    display_name,
                    series_index,
                    index: res.index,
                    previous_status,
                    status,
                });
            }
            None => {
                self.summary.on_inserted(status);
                emit(TreeEventKind::EntryInserted {
                    series_name: series_name.clone(),
                    display_name,
                    series_index,
                    index: res.index,
                    status,
                });
            }
        }

        if !status.is_success() {
            debug!(series = %series_name, %status, "revealing series");
            emit(TreeEventKind::Reveal {
                path: SeriesPath::new(series_index, series_name),
            });
        }

        UpsertOutcome {
            series_index,
            index: res.index,
            was_replace: res.was_replace(),
        }
    }

    /// Returns the series under the root.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn series(&self) -> &SeriesIndex {
        self.assert_confined("ResultTree::series");
        &self.series
    }

    /// Looks up a series by exact name.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn series_named(&self, name: &str) -> Option<&SeriesNode> {
        self.series()
            .get_by_name(name)
            .map(|(_, series)| series)
    }

    /// Returns counts of the entries currently in the tree.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn summary(&self) -> &RunSummary {
        self.assert_confined("ResultTree::summary");
        &self.summary
    }

    /// Returns the number of records applied so far.
    pub fn applied_count(&self) -> u64 {
        self.sequence
    }

    /// Returns an owned copy of the tree's contents.
    ///
    /// # Panics
    ///
    /// Panics if called from a thread other than the mutator thread.
    pub fn snapshot(&self) -> TreeSnapshot {
        self.assert_confined("ResultTree::snapshot");
        TreeSnapshot {
            series: self
                .series
                .iter()
                .map(|series| SeriesSnapshot {
                    name: series.name().into(),
                    entries: series
                        .children()
                        .iter()
                        .map(|node| node.record().clone())
                        .collect(),
                })
                .collect(),
            summary: self.summary,
        }
    }

    /// Returns how records are matched to existing entries.
    pub fn key_mode(&self) -> UpsertKeyMode {
        self.key_mode
    }

    /// Returns the mutator thread this tree is confined to.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Checks that the current thread is the mutator thread.
    pub fn check_confined(&self, operation: &'static str) -> Result<(), ConfinementViolation> {
        let current = thread::current().id();
        if current == self.owner {
            Ok(())
        } else {
            Err(ConfinementViolation::new(operation, self.owner, current))
        }
    }

    pub(crate) fn assert_confined(&self, operation: &'static str) {
        if let Err(violation) = self.check_confined(operation) {
            panic!("{violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_strategy::proptest;
    use testtree_metadata::ResultStatus;

    fn tree() -> ResultTree {
        ResultTree::new(&TreeConfig::default())
    }

    fn apply(
        tree: &mut ResultTree,
        events: &mut Vec<TreeEventKind>,
        series: &str,
        display_name: &str,
        status: ResultStatus,
    ) -> UpsertOutcome {
        tree.upsert(ResultRecord::new(series, display_name, status), |event| {
            events.push(event.kind)
        })
    }

    #[test]
    fn alpha_beta_scenario() {
        let mut tree = tree();
        let mut events = Vec::new();

        apply(&mut tree, &mut events, "Series1", "Alpha", ResultStatus::Successful);
        apply(&mut tree, &mut events, "Series1", "beta", ResultStatus::Failed);
        let outcome = apply(&mut tree, &mut events, "Series1", "Alpha", ResultStatus::Failed);
        assert_eq!(
            outcome,
            UpsertOutcome {
                series_index: 0,
                index: 0,
                was_replace: true,
            }
        );

        let snapshot = tree.snapshot();
        assert_eq!(snapshot.series.len(), 1);
        let series = &snapshot.series[0];
        assert_eq!(series.display_names(), ["Alpha", "beta"]);
        assert_eq!(series.entries[0].status(), ResultStatus::Failed);

        let path = SeriesPath::new(0, "Series1".into());
        assert_eq!(
            events,
            [
                TreeEventKind::SeriesInserted {
                    series_name: "Series1".into(),
                    series_index: 0,
                },
                TreeEventKind::FirstContent {
                    series_name: "Series1".into(),
                },
                TreeEventKind::EntryInserted {
                    series_name: "Series1".into(),
                    display_name: "Alpha".into(),
                    series_index: 0,
                    index: 0,
                    status: ResultStatus::Successful,
                },
                TreeEventKind::EntryInserted {
                    series_name: "Series1".into(),
                    display_name: "beta".into(),
                    series_index: 0,
                    index: 1,
                    status: ResultStatus::Failed,
                },
                TreeEventKind::Reveal { path: path.clone() },
                TreeEventKind::EntryReplaced {
                    series_name: "Series1".into(),
                    display_name: "Alpha".into(),
                    series_index: 0,
                    index: 0,
                    previous_status: ResultStatus::Successful,
                    status: ResultStatus::Failed,
                },
                TreeEventKind::Reveal { path },
            ]
        );

        assert_eq!(snapshot.summary.failed, 2);
        assert_eq!(snapshot.summary.successful, 0);
        assert_eq!(snapshot.summary.applied_count, 3);
        assert_eq!(tree.applied_count(), 3);
    }

    #[test]
    fn events_share_sequence_per_upsert() {
        let mut tree = tree();
        let mut sequences = Vec::new();
        for status in [ResultStatus::Failed, ResultStatus::Successful] {
            tree.upsert(ResultRecord::new("s", "d", status), |event| {
                sequences.push(event.sequence)
            });
        }
        // First upsert: series inserted, first content, entry inserted, reveal.
        // Second upsert: entry replaced.
        assert_eq!(sequences, [0, 0, 0, 0, 1]);
    }

    #[test]
    fn series_keep_first_seen_order() {
        let mut tree = tree();
        let mut events = Vec::new();
        for (series, name) in [("A", "1"), ("B", "1"), ("A", "2"), ("B", "0"), ("A", "0")] {
            apply(&mut tree, &mut events, series, name, ResultStatus::Successful);
        }

        let names: Vec<_> = tree.series().iter().map(SeriesNode::name).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(tree.summary().series_count, 2);
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, TreeEventKind::Reveal { .. })),
            "successful records never reveal"
        );
    }

    #[test]
    fn empty_names_are_literal() {
        let mut tree = tree();
        let mut events = Vec::new();
        apply(&mut tree, &mut events, "", "", ResultStatus::Skipped);
        apply(&mut tree, &mut events, "", "", ResultStatus::Skipped);

        let series = tree.series_named("").expect("empty series name exists");
        assert_eq!(series.children().len(), 1);
    }

    #[test]
    fn unique_id_mode_keeps_colliding_names_apart() {
        let config = TreeConfig {
            upsert_key: UpsertKeyMode::DisplayNameAndId,
            ..TreeConfig::default()
        };
        let mut tree = ResultTree::new(&config);
        for id in ["b", "a", "b"] {
            let record = ResultRecord::new("s", "same", ResultStatus::Successful).with_unique_id(id);
            tree.upsert(record, |_| {});
        }

        let ids: Vec<_> = tree
            .series_named("s")
            .expect("series exists")
            .children()
            .iter()
            .map(|node| node.record().unique_id())
            .collect();
        assert_eq!(ids, [Some("a"), Some("b")]);
    }

    #[test]
    fn access_from_other_thread_panics() {
        let mut tree = tree();
        tree.upsert(
            ResultRecord::new("s", "d", ResultStatus::Successful),
            |_| {},
        );
        let owner = tree.owner();

        let violation = std::thread::spawn(move || {
            let err = tree
                .check_confined("snapshot")
                .expect_err("other thread is not the owner");
            let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                tree.upsert(
                    ResultRecord::new("s", "d", ResultStatus::Failed),
                    |_| {},
                );
            }));
            assert!(res.is_err(), "upsert from another thread panics");
            err
        })
        .join()
        .expect("thread completed");

        assert_eq!(violation.operation(), "snapshot");
        assert_eq!(violation.owner(), owner);
        assert_ne!(violation.accessed_from(), owner);
    }

    #[proptest]
    fn last_write_wins_and_children_stay_sorted(
        #[strategy(prop::collection::vec(any::<ResultRecord>(), 0..48))] records: Vec<ResultRecord>,
    ) {
        let mut tree = tree();
        let mut reveals = Vec::new();
        for record in &records {
            let status = record.status();
            let mut revealed = false;
            tree.upsert(record.clone(), |event| {
                if let TreeEventKind::Reveal { path } = event.kind {
                    revealed = true;
                    reveals.push(path);
                }
            });
            prop_assert_eq!(revealed, !status.is_success());
        }

        let snapshot = tree.snapshot();
        let mut total = 0;
        for series in &snapshot.series {
            let folded: Vec<_> = series
                .entries
                .iter()
                .map(|record| record.display_name().to_lowercase())
                .collect();
            prop_assert!(folded.windows(2).all(|w| w[0] < w[1]), "{:?}", folded);

            // Each entry holds the last record applied for its key.
            for entry in &series.entries {
                let last = records
                    .iter()
                    .rev()
                    .find(|record| {
                        record.series_name() == series.name.as_str()
                            && record.display_name().to_lowercase()
                                == entry.display_name().to_lowercase()
                    })
                    .expect("entry came from some record");
                prop_assert_eq!(last, entry);
            }
            total += series.entries.len();
        }
        prop_assert_eq!(total, snapshot.summary.entry_count());
        prop_assert_eq!(snapshot.summary.applied_count, records.len());
    }
}
