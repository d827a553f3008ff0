// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `testtree` failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TestTreeExitCode {}

impl TestTreeExitCode {
    /// No errors occurred and every entry in the tree succeeded or was skipped.
    pub const OK: i32 = 0;

    /// No records were received, but no other errors occurred.
    pub const NO_RECORDS: i32 = 4;

    /// One or more entries in the final tree failed, aborted, or ended with
    /// some other non-successful status.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// A record in the input stream could not be parsed.
    pub const RECORD_PARSE_FAILED: i32 = 104;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a testtree invocation.
    pub const SETUP_ERROR: i32 = 96;
}
