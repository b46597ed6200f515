// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::map::IndexMap;
use std::{fmt, sync::Arc};

/// A single `testsuite` element read from a report.
///
/// A `Testsuite` groups its testcases, failures and errors by class name. The counts are the ones
/// declared by the report: they are never recomputed from the children, since test runners don't
/// always emit an element for every test they count.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Testsuite {
    /// The name of this testsuite. Not necessarily unique across reports.
    pub name: String,

    /// The number of tests this testsuite declares.
    pub tests: usize,

    /// The number of skipped tests this testsuite declares.
    pub skipped: usize,

    /// The number of failed tests this testsuite declares.
    ///
    /// A "failure" is usually some sort of *expected* issue in a test, such as a failed assertion.
    pub failures: usize,

    /// The number of errored tests this testsuite declares.
    ///
    /// An "error" is usually some sort of *unexpected* issue in a test.
    pub errors: usize,

    /// Testcases, keyed by class name, in document order.
    pub cases_by_class: IndexMap<String, Vec<Arc<Testcase>>>,

    /// Failures, keyed by the class name of the failing testcase, in document order.
    pub failures_by_class: IndexMap<String, Vec<TestFailure>>,

    /// Errors, keyed by the class name of the errored testcase, in document order.
    pub errors_by_class: IndexMap<String, Vec<TestError>>,
}

impl Testsuite {
    /// Creates a new, empty `Testsuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: 0,
            skipped: 0,
            failures: 0,
            errors: 0,
            cases_by_class: IndexMap::new(),
            failures_by_class: IndexMap::new(),
            errors_by_class: IndexMap::new(),
        }
    }

    /// Sets the declared counts for this testsuite.
    pub fn set_counts(
        &mut self,
        tests: usize,
        skipped: usize,
        failures: usize,
        errors: usize,
    ) -> &mut Self {
        self.tests = tests;
        self.skipped = skipped;
        self.failures = failures;
        self.errors = errors;
        self
    }

    /// Adds a testcase under its class name, returning the shared handle to it.
    ///
    /// Failures and errors for this testcase should be created from the returned handle.
    pub fn add_testcase(&mut self, testcase: Testcase) -> Arc<Testcase> {
        let testcase = Arc::new(testcase);
        self.cases_by_class
            .entry(testcase.classname.clone())
            .or_default()
            .push(Arc::clone(&testcase));
        testcase
    }

    /// Adds a failure under the class name of its testcase.
    ///
    /// Returns the index of the failure within its class.
    pub fn add_failure(&mut self, failure: TestFailure) -> usize {
        let failures = self
            .failures_by_class
            .entry(failure.classname().to_owned())
            .or_default();
        failures.push(failure);
        failures.len() - 1
    }

    /// Adds an error under the class name of its testcase.
    ///
    /// Returns the index of the error within its class.
    pub fn add_error(&mut self, error: TestError) -> usize {
        let errors = self
            .errors_by_class
            .entry(error.classname().to_owned())
            .or_default();
        errors.push(error);
        errors.len() - 1
    }

    /// Returns the number of testcase elements actually present in this testsuite.
    pub fn testcase_count(&self) -> usize {
        self.cases_by_class.values().map(Vec::len).sum()
    }
}

/// Represents a single testcase.
///
/// A testcase only records that a test ran. Its outcome, if it did not pass, is described by a
/// [`TestFailure`] or [`TestError`] pointing back at it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub struct Testcase {
    /// The name of the testcase.
    pub name: String,

    /// The "classname" of the testcase: the class or module under test.
    pub classname: String,

    /// The time it took to execute this testcase, exactly as reported.
    pub time: String,

    /// How many testcases with the same classname and name preceded this one in its testsuite.
    ///
    /// This is non-zero for tests that a runner reported more than once, e.g. across retries.
    /// Sibling testsuites count separately.
    pub occurrence: usize,
}

impl Testcase {
    /// Creates a new testcase.
    pub fn new(
        name: impl Into<String>,
        classname: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            classname: classname.into(),
            time: time.into(),
            occurrence: 0,
        }
    }

    /// Sets the occurrence index of this testcase.
    pub fn set_occurrence(&mut self, occurrence: usize) -> &mut Self {
        self.occurrence = occurrence;
        self
    }

    /// Returns the key identifying this testcase within its testsuite.
    pub fn key(&self) -> TestcaseKey<'_> {
        TestcaseKey {
            classname: &self.classname,
            name: &self.name,
            occurrence: self.occurrence,
        }
    }
}

/// Identifies a testcase within a testsuite: its class, its name, and which occurrence it is.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TestcaseKey<'a> {
    /// The class name.
    pub classname: &'a str,

    /// The testcase name.
    pub name: &'a str,

    /// The occurrence index, see [`Testcase::occurrence`].
    pub occurrence: usize,
}

impl fmt::Display for TestcaseKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.classname, self.name)?;
        if self.occurrence > 0 {
            write!(f, " (attempt {})", self.occurrence + 1)?;
        }
        Ok(())
    }
}

/// A `failure` element: a test that failed in an expected way.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct TestFailure {
    /// The testcase this failure belongs to.
    pub testcase: Arc<Testcase>,

    /// The failure message.
    pub message: String,

    /// The "type" of failure that occurred.
    pub ty: String,

    /// The text content of the element, e.g. a stack trace.
    pub content: String,
}

impl TestFailure {
    /// Creates a new failure for the given testcase, with empty content.
    pub fn new(testcase: Arc<Testcase>, message: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            testcase,
            message: message.into(),
            ty: ty.into(),
            content: String::new(),
        }
    }

    /// Returns the class name this failure is grouped under.
    pub fn classname(&self) -> &str {
        &self.testcase.classname
    }
}

/// An `error` element: a test that failed in an unexpected way.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct TestError {
    /// The testcase this error belongs to.
    pub testcase: Arc<Testcase>,

    /// The "type" of error that occurred.
    pub ty: String,

    /// The text content of the element, e.g. a stack trace.
    pub content: String,
}

impl TestError {
    /// Creates a new error for the given testcase, with empty content.
    pub fn new(testcase: Arc<Testcase>, ty: impl Into<String>) -> Self {
        Self {
            testcase,
            ty: ty.into(),
            content: String::new(),
        }
    }

    /// Returns the class name this error is grouped under.
    pub fn classname(&self) -> &str {
        &self.testcase.classname
    }
}
