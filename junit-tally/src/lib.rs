// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read JUnit reports in a single streaming pass and tally them across files.
//!
//! The entry points are [`parse_report_file`] for a single report, and [`Aggregator`] for folding
//! any number of reports into one [`Summary`].

#![warn(missing_docs)]

mod aggregate;
mod errors;
mod parse;
mod report;

pub use aggregate::*;
pub use errors::*;
pub use parse::*;
pub use report::*;
