// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while reading reports.

use camino::{Utf8Path, Utf8PathBuf};
use std::{error::Error, fmt, io, num::ParseIntError, sync::Arc};
use thiserror::Error;

/// An error that occurs while reading a report from disk.
///
/// Returned by [`parse_report_file`](crate::parse_report_file) and
/// [`Aggregator::add_report_file`](crate::Aggregator::add_report_file).
#[derive(Clone, Debug, Error)]
pub enum ReportError {
    /// The report could not be opened or read.
    #[error("failed to read JUnit report `{path}`")]
    Read {
        /// The path to the report.
        path: Utf8PathBuf,

        /// The underlying I/O error.
        #[source]
        err: Arc<io::Error>,
    },

    /// The report was read, but is not a well-formed JUnit report.
    #[error(transparent)]
    Malformed(#[from] MalformedReport),
}

impl ReportError {
    /// Returns the path to the report this error is about.
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Read { path, .. } => path,
            Self::Malformed(err) => err.path(),
        }
    }
}

/// A report that does not conform to the expected nested structure.
#[derive(Clone, Debug, Error)]
#[error("malformed JUnit report `{path}`")]
pub struct MalformedReport {
    path: Utf8PathBuf,
    #[source]
    kind: MalformedReportKind,
}

impl MalformedReport {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, kind: MalformedReportKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns the path to the report.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns what was wrong with the report.
    pub fn kind(&self) -> &MalformedReportKind {
        &self.kind
    }
}

/// The ways in which a report can be malformed.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum MalformedReportKind {
    /// An element is missing an attribute that must be present.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        /// The element name.
        element: &'static str,
        /// The attribute name.
        attribute: &'static str,
    },

    /// An attribute could not be read, e.g. because it is duplicated or contains a bad escape.
    #[error("attribute `{attribute}` of <{element}> could not be read")]
    InvalidAttribute {
        /// The element name.
        element: &'static str,
        /// The attribute name.
        attribute: &'static str,
        /// The error produced by the XML reader.
        #[source]
        err: quick_xml::Error,
    },

    /// A count attribute is not a non-negative integer.
    #[error("attribute `{attribute}` of <{element}> must be a non-negative integer, found `{value}`")]
    InvalidCount {
        /// The element name.
        element: &'static str,
        /// The attribute name.
        attribute: &'static str,
        /// The value that was found.
        value: String,
        /// The parse error.
        #[source]
        err: ParseIntError,
    },

    /// An element appeared without the element that must enclose it.
    #[error("<{element}> found outside of a <{expected}>")]
    Orphan {
        /// The element that was found.
        element: &'static str,
        /// The element that should have enclosed it.
        expected: &'static str,
    },

    /// The underlying XML is invalid.
    #[error("invalid XML at byte offset {position}")]
    Syntax {
        /// The byte offset at which the error was detected.
        position: usize,
        /// The error produced by the XML reader.
        #[source]
        err: quick_xml::Error,
    },

    /// The document ended while an element was still open.
    #[error("unexpected end of document: <{element}> is not closed")]
    Unclosed {
        /// The innermost element that was still open.
        element: String,
    },

    /// The document contains no elements at all.
    #[error("document has no root element")]
    NoRootElement,
}

/// Displays an error along with its chain of sources, on a single line.
///
/// Used for warnings, where there's only room for one line per error.
pub struct DisplayErrorChain<E>(pub E);

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
