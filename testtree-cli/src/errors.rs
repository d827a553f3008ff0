// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use testtree_core::errors::{ConfigParseError, MutatorSpawnError};
use testtree_metadata::{RecordLinesError, TestTreeExitCode};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which colorizes them.

/// An error that ends the run with a non-zero exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to open input file")]
    InputOpenError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to read result records")]
    RecordReadError {
        input: String,
        #[source]
        err: RecordLinesError,
    },
    #[error("failed to start mutator thread")]
    MutatorSpawnError {
        #[from]
        err: MutatorSpawnError,
    },
    #[error("failed to start producer thread")]
    ProducerSpawnError {
        producer: usize,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to serialize tree")]
    SerializeError {
        #[source]
        err: serde_json::Error,
    },
    #[error("failed to write output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn input_open_error(path: Utf8PathBuf, err: std::io::Error) -> Self {
        Self::InputOpenError { path, err }
    }

    pub(crate) fn record_read_error(input: impl Into<String>, err: RecordLinesError) -> Self {
        Self::RecordReadError {
            input: input.into(),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::InputOpenError { .. }
            | Self::MutatorSpawnError { .. }
            | Self::ProducerSpawnError { .. } => TestTreeExitCode::SETUP_ERROR,
            Self::RecordReadError { err, .. } => match err {
                RecordLinesError::Read(_) => TestTreeExitCode::SETUP_ERROR,
                RecordLinesError::Parse(_) => TestTreeExitCode::RECORD_PARSE_FAILED,
            },
            Self::SerializeError { .. } | Self::WriteOutputError { .. } => {
                TestTreeExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse testtree config at `{}`",
                    err.config_file().style(styles.bold)
                );
                Some(err.kind() as &dyn Error)
            }
            Self::InputOpenError { path, err } => {
                error!("failed to open input file `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::RecordReadError { input, err } => {
                error!("failed to read result records from {}", input.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::MutatorSpawnError { err } => {
                error!("failed to start mutator thread");
                Some(err as &dyn Error)
            }
            Self::ProducerSpawnError { producer, err } => {
                error!("failed to start producer thread {producer}");
                Some(err as &dyn Error)
            }
            Self::SerializeError { err } => {
                error!("failed to serialize result tree as JSON");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(
                target: NO_HEADING_TARGET,
                "\n{}\n  {}",
                "Caused by:".style(styles.warning_text),
                err,
            );
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testtree_metadata::ResultRecord;

    #[test]
    fn parse_failures_have_their_own_exit_code() {
        let parse_err = ResultRecord::from_json_str("{not json").expect_err("input is invalid");
        let err = ExpectedError::record_read_error("stdin", RecordLinesError::Parse(parse_err));
        assert_eq!(
            err.process_exit_code(),
            TestTreeExitCode::RECORD_PARSE_FAILED
        );

        let io_err = std::io::Error::other("disk on fire");
        let err = ExpectedError::record_read_error("stdin", RecordLinesError::Read(io_err));
        assert_eq!(err.process_exit_code(), TestTreeExitCode::SETUP_ERROR);
    }
}
