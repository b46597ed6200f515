// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summarize a directory of JUnit XML reports.
//!
//! This crate holds the `junit-tally` command-line tool. Parsing and aggregation live in the
//! [`junit_tally`] library.

#![warn(missing_docs)]

mod config;
mod discover;
mod dispatch;
mod display;
mod errors;
mod exit_codes;
mod output;

pub use config::{OnMalformed, ReportConfig, TallyConfig};
pub use discover::ReportDiscovery;
#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
pub use exit_codes::TallyExitCode;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
