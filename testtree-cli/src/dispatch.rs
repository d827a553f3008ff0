// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts},
    presenter::{ExpansionState, Styles, TreePresenter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    num::NonZeroUsize,
    sync::{Arc, Mutex},
    thread,
};
use testtree_core::{
    config::{DefaultConfigWarnings, TestTreeConfig},
    dispatcher::{MutatorThread, ResultSender, result_channel},
    tree::TreeSnapshot,
};
use testtree_metadata::{RecordLines, ResultRecord, TestTreeExitCode};
use tracing::{debug, info, warn};

/// Aggregates streamed test results into a sorted tree.
#[derive(Debug, Parser)]
#[command(
    name = "testtree",
    version,
    max_term_width = 100,
)]
pub struct TestTreeApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl TestTreeApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing the final tree to `stdout`.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, stdout: &mut impl Write) -> Result<i32> {
        match self.command {
            Command::Ingest(opts) => opts.exec(output, stdout),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read JSON-lines result records and print the resulting tree
    ///
    /// Records are handed to several producer threads, which submit them
    /// concurrently. Once every record has been applied, the final tree is
    /// printed.
    Ingest(IngestOpts),
}

#[derive(Debug, Args)]
struct IngestOpts {
    /// File to read records from [default: standard input]
    #[arg(long, short, value_name = "PATH")]
    input: Option<Utf8PathBuf>,

    /// Number of producer threads submitting records
    #[arg(long, short = 'j', value_name = "N", default_value = "4")]
    producers: NonZeroUsize,

    /// Config file [default: .config/testtree.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// An indented tree followed by a summary line
    #[default]
    Text,
    /// The final tree as JSON
    Json,
}

impl IngestOpts {
    fn exec(self, output: OutputContext, writer: &mut impl Write) -> Result<i32> {
        let config = TestTreeConfig::from_sources(
            Utf8Path::new("."),
            self.config.as_deref(),
            &mut DefaultConfigWarnings,
        )?;

        let records = match &self.input {
            Some(path) => {
                let file = File::open(path)
                    .map_err(|err| ExpectedError::input_open_error(path.clone(), err))?;
                read_records(BufReader::new(file), path.as_str())?
            }
            None => read_records(io::stdin().lock(), "standard input")?,
        };
        debug!(count = records.len(), "read result records");

        let (snapshot, expansion) = ingest(records, self.producers, config)?;

        match self.format {
            OutputFormat::Text => {
                let mut styles = Styles::default();
                if output.colorize_stdout() {
                    styles.colorize();
                }
                let mut out = String::new();
                TreePresenter::new(&styles, &expansion, output.verbose)
                    .write_tree(&snapshot, &mut out);
                writer
                    .write_all(out.as_bytes())
                    .map_err(|err| ExpectedError::WriteOutputError { err })?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, &snapshot)
                    .map_err(|err| ExpectedError::SerializeError { err })?;
                writeln!(writer).map_err(|err| ExpectedError::WriteOutputError { err })?;
            }
        }
        writer
            .flush()
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        Ok(exit_code(&snapshot))
    }
}

fn read_records(reader: impl BufRead, input: &str) -> Result<Vec<ResultRecord>> {
    RecordLines::new(reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| ExpectedError::record_read_error(input, err))
}

/// Applies `records` to a new tree, submitting them from `producers` threads.
///
/// Records are dealt out round-robin, so each producer submits every Nth
/// record in input order.
fn ingest(
    records: Vec<ResultRecord>,
    producers: NonZeroUsize,
    config: TestTreeConfig,
) -> Result<(TreeSnapshot, ExpansionState)> {
    let (sender, pending) = result_channel();

    let expansion = Arc::new(Mutex::new(ExpansionState::default()));
    let observer = expansion.clone();
    let mutator = MutatorThread::spawn(pending, config, move |event| {
        observer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&event);
    })?;

    let mut batches: Vec<Vec<ResultRecord>> = vec![Vec::new(); producers.get()];
    for (i, record) in records.into_iter().enumerate() {
        batches[i % producers.get()].push(record);
    }

    let handles = batches
        .into_iter()
        .enumerate()
        .map(|(producer, batch)| spawn_producer(producer, batch, sender.clone()))
        .collect::<Result<Vec<_>>>()?;
    // The mutator finishes once every producer has dropped its sender.
    drop(sender);

    for handle in handles {
        if let Err(panic) = handle.join() {
            std::panic::resume_unwind(panic);
        }
    }
    let snapshot = mutator.join();

    let expansion = match Arc::try_unwrap(expansion) {
        Ok(expansion) => expansion
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner()),
        Err(shared) => shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone(),
    };
    Ok((snapshot, expansion))
}

fn spawn_producer(
    producer: usize,
    batch: Vec<ResultRecord>,
    sender: ResultSender,
) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("testtree-producer-{producer}"))
        .spawn(move || {
            debug!(producer, count = batch.len(), "producer started");
            for record in batch {
                sender.submit(record);
            }
        })
        .map_err(|err| ExpectedError::ProducerSpawnError { producer, err })
}

fn exit_code(snapshot: &TreeSnapshot) -> i32 {
    let summary = &snapshot.summary;
    if summary.entry_count() == 0 {
        warn!("no result records were read");
        TestTreeExitCode::NO_RECORDS
    } else if summary.any_failed() {
        info!(
            failed = summary.failed,
            aborted = summary.aborted,
            other = summary.other,
            "run has failures"
        );
        TestTreeExitCode::TEST_RUN_FAILED
    } else {
        TestTreeExitCode::OK
    }
}
