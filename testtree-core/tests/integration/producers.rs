// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use std::thread;
use testtree_core::{
    config::TestTreeConfig,
    dispatcher::{MutatorThread, result_channel},
    events::TreeEventKind,
};
use testtree_metadata::ResultStatus;

#[test]
fn mixed_results_through_mutator_thread() -> Result<()> {
    let (sender, pending) = result_channel();
    let log = EventLog::default();
    let mutator = MutatorThread::spawn(pending, TestTreeConfig::default_config(), log.callback())?;

    let producer = {
        let sender = sender.clone();
        thread::spawn(move || {
            sender.submit(record("Alpha", "b", ResultStatus::Successful));
            sender.submit(record("Alpha", "a", ResultStatus::Failed));
            sender.submit(record("Beta", "x", ResultStatus::Skipped));
            sender.submit(record("Alpha", "A", ResultStatus::Successful));
        })
    };
    producer.join().expect("producer thread succeeded");
    drop(sender);

    let snapshot = mutator.join();
    let names: Vec<_> = snapshot.series.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta"]);

    let alpha = snapshot.series_named("Alpha").expect("Alpha exists");
    assert_eq!(alpha.display_names(), ["A", "b"]);
    assert_eq!(alpha.entries[0].status(), ResultStatus::Successful);

    assert_eq!(snapshot.summary.series_count, 2);
    assert_eq!(snapshot.summary.applied_count, 4);
    assert_eq!(snapshot.summary.successful, 2);
    assert_eq!(snapshot.summary.skipped, 1);
    assert_eq!(snapshot.summary.failed, 0);

    assert_eq!(log.reveal_count("Alpha"), 1);
    assert_eq!(log.reveal_count("Beta"), 1);

    let first_content: Vec<_> = log
        .events()
        .into_iter()
        .filter_map(|event| match event.kind {
            TreeEventKind::FirstContent { series_name } => Some(series_name),
            _ => None,
        })
        .collect();
    assert_eq!(first_content, ["Alpha"]);

    Ok(())
}

#[test]
fn many_producers_converge() -> Result<()> {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 50;

    let (sender, pending) = result_channel();
    let log = EventLog::default();
    let mutator = MutatorThread::spawn(pending, TestTreeConfig::default_config(), log.callback())?;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let sender = sender.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    // Every producer writes the same names into a shared series,
                    // so most submissions replace an existing entry.
                    let status = if i % 10 == 0 && producer == 0 {
                        ResultStatus::Failed
                    } else {
                        ResultStatus::Successful
                    };
                    sender.submit(record("shared", &format!("case-{i:02}"), status));
                    sender.submit(record(
                        &format!("own-{producer}"),
                        &format!("case-{i:02}"),
                        ResultStatus::Successful,
                    ));
                }
            })
        })
        .collect();
    drop(sender);
    for producer in producers {
        producer.join().expect("producer thread succeeded");
    }

    let snapshot = mutator.join();
    assert_eq!(snapshot.series.len(), PRODUCERS + 1);
    assert_eq!(snapshot.summary.applied_count, 2 * PRODUCERS * PER_PRODUCER);

    let expected: Vec<_> = (0..PER_PRODUCER).map(|i| format!("case-{i:02}")).collect();
    for series in &snapshot.series {
        assert_eq!(series.display_names(), expected, "series {} is sorted", series.name);
    }
    assert_eq!(snapshot.summary.entry_count(), (PRODUCERS + 1) * PER_PRODUCER);

    // Every record becomes exactly one insertion or replacement event.
    let applied = log
        .events()
        .iter()
        .filter(|event| {
            matches!(
                event.kind,
                TreeEventKind::EntryInserted { .. } | TreeEventKind::EntryReplaced { .. }
            )
        })
        .count();
    assert_eq!(applied, 2 * PRODUCERS * PER_PRODUCER);
    assert_eq!(log.reveal_count("shared"), PER_PRODUCER / 10);

    Ok(())
}
