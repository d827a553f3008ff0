// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino_tempfile::Utf8TempDir;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::{collections::BTreeSet, fs};
use testtree_core::{
    config::{ConfigWarnings, TestTreeConfig},
    dispatcher::{MutatorThread, result_channel},
    tree::UpsertKeyMode,
};
use testtree_metadata::ResultStatus;

#[derive(Default)]
struct RecordedWarnings {
    unknown: BTreeSet<String>,
}

impl ConfigWarnings for RecordedWarnings {
    fn unknown_config_keys(&mut self, _config_file: &camino::Utf8Path, unknown: &BTreeSet<String>) {
        self.unknown.extend(unknown.iter().cloned());
    }
}

#[test]
fn repo_config_changes_upsert_key() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    fs::create_dir_all(dir.path().join(".config"))?;
    fs::write(
        dir.path().join(TestTreeConfig::CONFIG_PATH),
        indoc! {r#"
            [tree]
            upsert-key = "display-name-and-id"
            reveal-first-series = false
            colour = "blue"
        "#},
    )?;

    let mut warnings = RecordedWarnings::default();
    let config = TestTreeConfig::from_sources(dir.path(), None, &mut warnings)?;
    assert_eq!(config.tree().upsert_key, UpsertKeyMode::DisplayNameAndId);
    assert!(!config.tree().reveal_first_series);
    assert_eq!(
        warnings.unknown.into_iter().collect::<Vec<_>>(),
        ["tree.colour"]
    );

    let (sender, pending) = result_channel();
    let log = EventLog::default();
    let mutator = MutatorThread::spawn(pending, config, log.callback())?;
    sender.submit(record("s", "same", ResultStatus::Successful).with_unique_id("one"));
    sender.submit(record("s", "same", ResultStatus::Successful).with_unique_id("two"));
    sender.submit(record("s", "SAME", ResultStatus::Failed).with_unique_id("one"));
    drop(sender);

    let snapshot = mutator.join();
    let series = snapshot.series_named("s").expect("series exists");
    assert_eq!(series.entries.len(), 2, "distinct ids are distinct entries");
    assert_eq!(snapshot.summary.failed, 1);
    assert_eq!(snapshot.summary.successful, 1);

    Ok(())
}

#[test]
fn explicit_config_file_is_used() -> Result<()> {
    let dir = Utf8TempDir::new()?;
    let path = dir.path().join("custom.toml");
    fs::write(&path, "[dispatcher]\nyield-every = 1\n")?;

    let config =
        TestTreeConfig::from_sources(dir.path(), Some(&path), &mut RecordedWarnings::default())?;
    assert_eq!(config.dispatcher().yield_every.get(), 1);
    assert_eq!(config.tree().upsert_key, UpsertKeyMode::DisplayName);

    Ok(())
}
