// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::ResultStatus;
use std::{error, fmt};

/// An error that occurs while parsing a [`ResultRecord`](crate::ResultRecord)
/// from its JSON representation.
#[derive(Debug)]
pub struct RecordParseError {
    line: Option<usize>,
    err: serde_json::Error,
}

impl RecordParseError {
    pub(crate) fn new(line: Option<usize>, err: serde_json::Error) -> Self {
        Self { line, err }
    }

    /// Returns the 1-based line number the error occurred on, if the record
    /// was read from a line-oriented stream.
    pub fn line(&self) -> Option<usize> {
        self.line
    }
}

impl fmt::Display for RecordParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "failed to parse result record on line {line}"),
            None => write!(f, "failed to parse result record"),
        }
    }
}

impl error::Error for RecordParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.err)
    }
}

/// An error that occurs while parsing a [`ResultStatus`] from a string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResultStatusParseError {
    input: String,
}

impl ResultStatusParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

impl fmt::Display for ResultStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unrecognized value for result status: {}\n(known values: {})",
            self.input,
            ResultStatus::variants().join(", "),
        )
    }
}

impl error::Error for ResultStatusParseError {}
