// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read a report in a single streaming pass.
//!
//! [`ReportHandler`] turns start, text and end events into [`Testsuite`]s. It never sees the
//! document as a whole: it keeps a stack of open testsuites, plus the testcase, failure and error
//! that are currently open, and clears each of them when the corresponding end event arrives.
//!
//! [`parse_report`] drives a quick-xml pull reader and feeds the handler, so only the records
//! built so far (and a single event buffer) are held in memory.

use crate::{
    errors::{MalformedReport, MalformedReportKind, ReportError},
    report::{TestError, TestFailure, Testcase, Testsuite},
};
use camino::Utf8Path;
use quick_xml::{
    Reader,
    escape::unescape,
    events::{BytesStart, Event},
};
use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    sync::Arc,
};

static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static ERROR_TAG: &str = "error";

/// Opens the report at `path` and parses it.
///
/// The file is read through a buffer and closed before this function returns, whether or not
/// parsing succeeded.
pub fn parse_report_file(path: &Utf8Path) -> Result<Vec<Testsuite>, ReportError> {
    let file = File::open(path).map_err(|err| ReportError::Read {
        path: path.to_owned(),
        err: Arc::new(err),
    })?;
    parse_report(BufReader::new(file), path)
}

/// Parses a report from `reader`.
///
/// `source` is only used to identify the report in errors and logs.
pub fn parse_report(
    reader: impl BufRead,
    source: &Utf8Path,
) -> Result<Vec<Testsuite>, ReportError> {
    let malformed = |kind| MalformedReport::new(source, kind);

    let mut reader = Reader::from_reader(reader);
    // Self-closing elements are reported as a start event immediately followed by an end event.
    reader.expand_empty_elements(true);

    let mut handler = ReportHandler::new();
    let mut open_elements: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        let event = match reader.read_event_into(&mut buf) {
            Ok(event) => event,
            Err(quick_xml::Error::Io(err)) => {
                return Err(ReportError::Read {
                    path: source.to_owned(),
                    err,
                });
            }
            Err(err) => {
                let position = reader.buffer_position();
                return Err(malformed(MalformedReportKind::Syntax { position, err }).into());
            }
        };

        match event {
            Event::Start(element) => {
                saw_root = true;
                open_elements.push(String::from_utf8_lossy(element.name().as_ref()).into_owned());
                handler.start_element(&element).map_err(malformed)?;
            }
            Event::End(element) => {
                open_elements.pop();
                handler.end_element(element.name().as_ref());
            }
            Event::Text(text) => {
                let syntax = |err| {
                    malformed(MalformedReportKind::Syntax {
                        position: reader.buffer_position(),
                        err,
                    })
                };
                // Line endings are normalized before entities are expanded, so `&#13;` survives.
                let raw = reader.decoder().decode(&text).map_err(syntax)?;
                let raw = normalize_newlines(&raw);
                let text = unescape(&raw).map_err(|err| syntax(err.into()))?;
                handler.text(&text);
            }
            Event::CData(cdata) => {
                let text = reader.decoder().decode(&cdata).map_err(|err| {
                    malformed(MalformedReportKind::Syntax {
                        position: reader.buffer_position(),
                        err,
                    })
                })?;
                handler.text(&normalize_newlines(&text));
            }
            Event::Eof => break,
            // Comments, processing instructions, the XML declaration and doctypes carry nothing
            // we need. Text on either side of a comment is still concatenated.
            _ => {}
        }
        buf.clear();
    }

    if let Some(element) = open_elements.pop() {
        return Err(malformed(MalformedReportKind::Unclosed { element }).into());
    }
    if !saw_root {
        return Err(malformed(MalformedReportKind::NoRootElement).into());
    }

    let testsuites = handler.finish();
    tracing::debug!("parsed {} testsuites from `{source}`", testsuites.len());
    Ok(testsuites)
}

/// Builds [`Testsuite`]s from a stream of XML events.
///
/// Use one handler per report. Testsuites are added to the output as soon as their start event
/// is seen, and are filled in by the events that follow.
#[derive(Debug, Default)]
pub struct ReportHandler {
    testsuites: Vec<Testsuite>,
    // Indexes into `testsuites`. The last element is the current testsuite.
    suite_stack: Vec<usize>,
    current_testcase: Option<Arc<Testcase>>,
    current_failure: Option<OpenDetail>,
    current_error: Option<OpenDetail>,
    // Keyed by (suite index, classname, name).
    occurrences: HashMap<(usize, String, String), usize>,
}

impl ReportHandler {
    /// Creates a new handler with no open elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles the start of an element.
    pub fn start_element(&mut self, element: &BytesStart<'_>) -> Result<(), MalformedReportKind> {
        match element.name().as_ref() {
            b"testsuite" => self.start_testsuite(element),
            b"testcase" => self.start_testcase(element),
            b"failure" => self.start_failure(element),
            b"error" => self.start_error(element),
            _ => Ok(()),
        }
    }

    /// Handles text inside the current element.
    ///
    /// Text is only kept while a failure or error is open. If both are open, which can only
    /// happen if one is nested in the other, the text is appended to both.
    pub fn text(&mut self, text: &str) {
        if let Some(failure) = &mut self.current_failure {
            failure.content.push_str(text);
        }
        if let Some(error) = &mut self.current_error {
            error.content.push_str(text);
        }
    }

    /// Handles the end of an element.
    pub fn end_element(&mut self, name: &[u8]) {
        match name {
            b"testsuite" => {
                self.suite_stack.pop();
            }
            b"testcase" => {
                self.current_testcase = None;
            }
            b"failure" => {
                if let Some(open) = self.current_failure.take()
                    && let Some(failure) = self.testsuites.get_mut(open.suite).and_then(|suite| {
                        suite
                            .failures_by_class
                            .get_mut(&open.classname)?
                            .get_mut(open.index)
                    })
                {
                    failure.content = open.content;
                }
            }
            b"error" => {
                if let Some(open) = self.current_error.take()
                    && let Some(error) = self.testsuites.get_mut(open.suite).and_then(|suite| {
                        suite
                            .errors_by_class
                            .get_mut(&open.classname)?
                            .get_mut(open.index)
                    })
                {
                    error.content = open.content;
                }
            }
            _ => {}
        }
    }

    /// Returns the testsuites read so far, in the order their start events were seen.
    pub fn finish(self) -> Vec<Testsuite> {
        self.testsuites
    }

    fn start_testsuite(&mut self, element: &BytesStart<'_>) -> Result<(), MalformedReportKind> {
        let name = required_attr(element, TESTSUITE_TAG, "name")?;
        let tests = required_count(element, TESTSUITE_TAG, "tests")?;
        let skipped = required_count(element, TESTSUITE_TAG, "skipped")?;
        let failures = required_count(element, TESTSUITE_TAG, "failures")?;
        let errors = required_count(element, TESTSUITE_TAG, "errors")?;

        let mut testsuite = Testsuite::new(name);
        testsuite.set_counts(tests, skipped, failures, errors);

        self.suite_stack.push(self.testsuites.len());
        self.testsuites.push(testsuite);
        Ok(())
    }

    fn start_testcase(&mut self, element: &BytesStart<'_>) -> Result<(), MalformedReportKind> {
        let suite = self.current_suite_index(TESTCASE_TAG)?;
        let name = required_attr(element, TESTCASE_TAG, "name")?;
        let classname = required_attr(element, TESTCASE_TAG, "classname")?;
        let time = required_attr(element, TESTCASE_TAG, "time")?;

        let occurrence = self
            .occurrences
            .entry((suite, classname.clone(), name.clone()))
            .or_insert(0);
        let mut testcase = Testcase::new(name, classname, time);
        testcase.set_occurrence(*occurrence);
        *occurrence += 1;

        let testcase = self.testsuites[suite].add_testcase(testcase);
        self.current_testcase = Some(testcase);
        Ok(())
    }

    fn start_failure(&mut self, element: &BytesStart<'_>) -> Result<(), MalformedReportKind> {
        let (suite, testcase) = self.current_testcase(FAILURE_TAG)?;
        let message = required_attr(element, FAILURE_TAG, "message")?;
        let ty = required_attr(element, FAILURE_TAG, "type")?;

        let classname = testcase.classname.clone();
        let index = self.testsuites[suite].add_failure(TestFailure::new(testcase, message, ty));
        self.current_failure = Some(OpenDetail::new(suite, classname, index));
        Ok(())
    }

    fn start_error(&mut self, element: &BytesStart<'_>) -> Result<(), MalformedReportKind> {
        let (suite, testcase) = self.current_testcase(ERROR_TAG)?;
        let ty = required_attr(element, ERROR_TAG, "type")?;

        let classname = testcase.classname.clone();
        let index = self.testsuites[suite].add_error(TestError::new(testcase, ty));
        self.current_error = Some(OpenDetail::new(suite, classname, index));
        Ok(())
    }

    fn current_suite_index(&self, element: &'static str) -> Result<usize, MalformedReportKind> {
        self.suite_stack
            .last()
            .copied()
            .ok_or(MalformedReportKind::Orphan {
                element,
                expected: TESTSUITE_TAG,
            })
    }

    fn current_testcase(
        &self,
        element: &'static str,
    ) -> Result<(usize, Arc<Testcase>), MalformedReportKind> {
        let testcase = self
            .current_testcase
            .clone()
            .ok_or(MalformedReportKind::Orphan {
                element,
                expected: TESTCASE_TAG,
            })?;
        let suite = self.current_suite_index(element)?;
        Ok((suite, testcase))
    }
}

/// A failure or error whose end event hasn't been seen yet.
///
/// The record itself is already part of its testsuite; this tracks where it lives and the text
/// collected for it so far.
#[derive(Debug)]
struct OpenDetail {
    suite: usize,
    classname: String,
    index: usize,
    content: String,
}

impl OpenDetail {
    fn new(suite: usize, classname: String, index: usize) -> Self {
        Self {
            suite,
            classname,
            index,
            content: String::new(),
        }
    }
}

/// Translates `\r\n` and lone `\r` to `\n`, as XML processors do.
fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn required_attr(
    element: &BytesStart<'_>,
    tag: &'static str,
    attribute: &'static str,
) -> Result<String, MalformedReportKind> {
    let invalid = |err: quick_xml::Error| MalformedReportKind::InvalidAttribute {
        element: tag,
        attribute,
        err,
    };

    let attr = element
        .try_get_attribute(attribute)
        .map_err(|err| invalid(err.into()))?
        .ok_or(MalformedReportKind::MissingAttribute {
            element: tag,
            attribute,
        })?;
    let value = attr.unescape_value().map_err(invalid)?;
    Ok(value.into_owned())
}

fn required_count(
    element: &BytesStart<'_>,
    tag: &'static str,
    attribute: &'static str,
) -> Result<usize, MalformedReportKind> {
    let value = required_attr(element, tag, attribute)?;
    value
        .trim()
        .parse()
        .map_err(|err| MalformedReportKind::InvalidCount {
            element: tag,
            attribute,
            value,
            err,
        })
}
