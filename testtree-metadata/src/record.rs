// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{RecordParseError, ResultStatusParseError};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, io, str::FromStr, time::Duration};

/// The outcome of one completed check.
///
/// Produced by an external execution engine: testtree never computes pass or
/// fail on its own.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultRecord {
    series_name: SmolStr,
    display_name: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unique_id: Option<SmolStr>,
    status: ResultStatus,
    #[serde(default, skip_serializing_if = "ResultPayload::is_empty")]
    payload: ResultPayload,
}

impl ResultRecord {
    /// Creates a new record with an empty payload.
    pub fn new(
        series_name: impl Into<SmolStr>,
        display_name: impl Into<SmolStr>,
        status: ResultStatus,
    ) -> Self {
        Self {
            series_name: series_name.into(),
            display_name: display_name.into(),
            unique_id: None,
            status,
            payload: ResultPayload::default(),
        }
    }

    /// Attaches an identifier that is unique to the underlying check.
    ///
    /// Display names are not guaranteed to be unique within a series. When
    /// the tree is configured to do so, this identifier also participates in
    /// matching records to existing entries.
    pub fn with_unique_id(mut self, unique_id: impl Into<SmolStr>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Attaches details for display.
    pub fn with_payload(mut self, payload: ResultPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Parses a record from a single JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, RecordParseError> {
        serde_json::from_str(input).map_err(|err| RecordParseError::new(None, err))
    }

    /// The name of the series (e.g. test class or category) this record
    /// belongs to.
    #[inline]
    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    /// The name shown for this record within its series.
    #[inline]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The caller-supplied unique identifier, if any.
    #[inline]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// The outcome of the check.
    #[inline]
    pub fn status(&self) -> ResultStatus {
        self.status
    }

    /// Opaque details for display.
    #[inline]
    pub fn payload(&self) -> &ResultPayload {
        &self.payload
    }
}

/// Details attached to a [`ResultRecord`].
///
/// testtree carries these through unchanged; they only matter to whatever
/// displays a selected entry.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultPayload {
    /// A short human-readable message, typically the failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// How long the check took to run.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    /// Captured output from the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ResultPayload {
    /// Returns true if no details are present.
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.duration.is_none() && self.output.is_none()
    }
}

/// The status of a completed check.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultStatus {
    /// The check passed.
    Successful,

    /// The check ran and failed an assertion.
    Failed,

    /// The check was interrupted before it could finish.
    Aborted,

    /// The check was not run.
    Skipped,

    /// Any other outcome reported by the execution engine.
    Other,
}

impl ResultStatus {
    /// All variants, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Successful,
        Self::Failed,
        Self::Aborted,
        Self::Skipped,
        Self::Other,
    ];

    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["successful", "failed", "aborted", "skipped", "other"]
    }

    /// Returns the string representation of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Skipped => "skipped",
            Self::Other => "other",
        }
    }

    /// Returns true if the check succeeded.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Successful)
    }

    /// Returns true if this status should fail a run.
    ///
    /// Skipped checks are not successful, but they don't fail a run either.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Aborted | Self::Other)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultStatus {
    type Err = ResultStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ResultStatusParseError::new(s))
    }
}

/// Reads newline-delimited JSON [`ResultRecord`]s from a buffered reader.
///
/// Blank lines are skipped. Each call to `next` yields either a record or the
/// first error encountered on that line.
#[derive(Debug)]
pub struct RecordLines<R> {
    reader: R,
    line_number: usize,
    buf: Vec<u8>,
}

impl<R: io::BufRead> RecordLines<R> {
    /// Creates a new reader over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: Vec::new(),
        }
    }
}

/// An error produced while reading [`RecordLines`].
#[derive(Debug)]
pub enum RecordLinesError {
    /// Reading from the underlying stream failed.
    Read(io::Error),

    /// A line could not be parsed as a record.
    Parse(RecordParseError),
}

impl fmt::Display for RecordLinesError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Read(_) => write!(f, "failed to read result records"),
            Self::Parse(_) => write!(f, "invalid result record in input"),
        }
    }
}

impl std::error::Error for RecordLinesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl<R: io::BufRead> Iterator for RecordLines<R> {
    type Item = Result<ResultRecord, RecordLinesError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            // Lines are read as bytes so that invalid UTF-8 is reported by
            // the JSON parser, with a line number, rather than as an I/O
            // error.
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buf.trim_ascii();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_slice(line).map_err(|err| {
                        RecordLinesError::Parse(RecordParseError::new(Some(self.line_number), err))
                    }));
                }
                Err(err) => return Some(Err(RecordLinesError::Read(err))),
            }
        }
    }
}

#[cfg(feature = "proptest1")]
mod proptest_impls {
    use super::*;
    use proptest::prelude::*;

    impl Arbitrary for ResultStatus {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            proptest::sample::select(Self::ALL.to_vec()).boxed()
        }
    }

    impl Arbitrary for ResultRecord {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
            // A small alphabet with mixed case makes case-insensitive
            // collisions likely.
            (
                "[a-cA-C]{0,2}",
                "[a-dA-D]{0,3}",
                any::<ResultStatus>(),
                proptest::option::of("[a-z]{1,8}"),
            )
                .prop_map(|(series, display, status, message)| {
                    ResultRecord::new(series, display, status).with_payload(ResultPayload {
                        message,
                        ..ResultPayload::default()
                    })
                })
                .boxed()
        }
    }
}
