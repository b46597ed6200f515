// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `junit-tally` failures.
///
/// Failed or errored tests inside the reports do not affect the exit code: a run that manages to
/// summarize every report exits with [`OK`](Self::OK).
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum TallyExitCode {}

impl TallyExitCode {
    /// No errors occurred and the summary was printed.
    pub const OK: i32 = 0;

    /// The report directory was not supplied, does not exist, or is not a directory.
    pub const INPUT_NOT_FOUND: i32 = 97;

    /// A user issue happened while setting up, e.g. a bad config file or glob.
    pub const SETUP_ERROR: i32 = 96;

    /// A report could not be read, or is not a well-formed JUnit report.
    pub const MALFORMED_REPORT: i32 = 104;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
