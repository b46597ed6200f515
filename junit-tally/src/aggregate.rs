// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fold the testsuites of many reports into a single [`Summary`].

use crate::{
    errors::{DisplayErrorChain, ReportError},
    parse::parse_report_file,
    report::{TestError, TestFailure, Testsuite},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;

/// What to do when a report can't be read or parsed.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum MalformedPolicy {
    /// Stop at the first bad report and return its error.
    #[default]
    Abort,

    /// Log a warning, remember the report in [`Summary::skipped_reports`], and carry on.
    Skip,
}

/// Options controlling what an [`Aggregator`] computes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct AggregateOptions {
    /// Whether to collect failures by class.
    pub failure_details: bool,

    /// Whether to collect errors by class.
    pub error_details: bool,

    /// What to do with bad reports.
    pub on_malformed: MalformedPolicy,
}

impl AggregateOptions {
    /// Creates options that only compute totals and abort on bad reports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether failures are collected by class.
    pub fn set_failure_details(&mut self, failure_details: bool) -> &mut Self {
        self.failure_details = failure_details;
        self
    }

    /// Sets whether errors are collected by class.
    pub fn set_error_details(&mut self, error_details: bool) -> &mut Self {
        self.error_details = error_details;
        self
    }

    /// Sets the policy for bad reports.
    pub fn set_on_malformed(&mut self, on_malformed: MalformedPolicy) -> &mut Self {
        self.on_malformed = on_malformed;
        self
    }
}

/// Totals summed over every testsuite seen.
///
/// Each count saturates at `usize::MAX` rather than wrapping.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// The number of tests.
    pub tests: usize,

    /// The number of skipped tests.
    pub skipped: usize,

    /// The number of failed tests.
    pub failures: usize,

    /// The number of errored tests.
    pub errors: usize,
}

impl Totals {
    /// Adds the declared counts of a testsuite.
    pub fn add_testsuite(&mut self, testsuite: &Testsuite) -> &mut Self {
        self.tests = self.tests.saturating_add(testsuite.tests);
        self.skipped = self.skipped.saturating_add(testsuite.skipped);
        self.failures = self.failures.saturating_add(testsuite.failures);
        self.errors = self.errors.saturating_add(testsuite.errors);
        self
    }
}

/// The result of aggregating a set of reports.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Summary {
    /// Totals across all reports.
    pub totals: Totals,

    /// Failures from all reports, by class name. Empty unless failure details were requested.
    ///
    /// Each class lists its failures in the order the reports were processed, then in document
    /// order. Failures that look identical are all kept.
    pub failures_by_class: IndexMap<String, Vec<TestFailure>>,

    /// Errors from all reports, by class name. Empty unless error details were requested.
    pub errors_by_class: IndexMap<String, Vec<TestError>>,

    /// The number of reports that were read successfully.
    pub reports_read: usize,

    /// Reports that were skipped because they could not be read or parsed.
    pub skipped_reports: Vec<Utf8PathBuf>,
}

/// Folds the testsuites of many reports into a single [`Summary`].
///
/// Reports are processed in the order they are added. The totals don't depend on that order;
/// the order of entries within a class does.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    options: AggregateOptions,
    summary: Summary,
}

impl Aggregator {
    /// Creates a new aggregator.
    pub fn new(options: AggregateOptions) -> Self {
        Self {
            options,
            summary: Summary::default(),
        }
    }

    /// Adds the testsuites read from a single report.
    pub fn add_testsuites(&mut self, testsuites: impl IntoIterator<Item = Testsuite>) -> &mut Self {
        for testsuite in testsuites {
            self.add_testsuite(testsuite);
        }
        self
    }

    /// Adds a single testsuite.
    pub fn add_testsuite(&mut self, testsuite: Testsuite) -> &mut Self {
        self.summary.totals.add_testsuite(&testsuite);
        tracing::trace!(
            "added testsuite `{}` (tests: {}, testcases: {}, failures: {}, errors: {})",
            testsuite.name,
            testsuite.tests,
            testsuite.testcase_count(),
            testsuite.failures,
            testsuite.errors,
        );

        // The per-suite testcase grouping is not part of the summary.
        let Testsuite {
            failures_by_class,
            errors_by_class,
            ..
        } = testsuite;
        if self.options.failure_details {
            merge_by_class(&mut self.summary.failures_by_class, failures_by_class);
        }
        if self.options.error_details {
            merge_by_class(&mut self.summary.errors_by_class, errors_by_class);
        }
        self
    }

    /// Parses the report at `path` and adds its testsuites.
    ///
    /// If the report can't be read or parsed, the error is returned under
    /// [`MalformedPolicy::Abort`]. Under [`MalformedPolicy::Skip`] a warning is logged, the path
    /// is recorded in [`Summary::skipped_reports`], and `Ok(())` is returned. Either way, nothing
    /// from a bad report is added to the totals.
    pub fn add_report_file(&mut self, path: &Utf8Path) -> Result<(), ReportError> {
        match parse_report_file(path) {
            Ok(testsuites) => {
                self.summary.reports_read += 1;
                self.add_testsuites(testsuites);
                Ok(())
            }
            Err(err) => match self.options.on_malformed {
                MalformedPolicy::Abort => Err(err),
                MalformedPolicy::Skip => {
                    tracing::warn!("skipping report: {}", DisplayErrorChain(&err));
                    self.summary.skipped_reports.push(path.to_owned());
                    Ok(())
                }
            },
        }
    }

    /// Adds every report in `paths`, in order, and returns the summary.
    pub fn aggregate<I>(mut self, paths: I) -> Result<Summary, ReportError>
    where
        I: IntoIterator,
        I::Item: AsRef<Utf8Path>,
    {
        for path in paths {
            self.add_report_file(path.as_ref())?;
        }
        Ok(self.finish())
    }

    /// Returns the summary so far.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Consumes the aggregator, returning the summary.
    pub fn finish(self) -> Summary {
        self.summary
    }
}

fn merge_by_class<T>(into: &mut IndexMap<String, Vec<T>>, from: IndexMap<String, Vec<T>>) {
    for (classname, items) in from {
        into.entry(classname).or_default().extend(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_report;
    use camino_tempfile::Utf8TempDir;
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;

    fn suites(input: &str) -> Vec<Testsuite> {
        parse_report(input.as_bytes(), Utf8Path::new("report.xml")).expect("report is well-formed")
    }

    fn error_report(class: &str, suite: &str) -> String {
        formatdoc! {r#"
            <testsuite name="{suite}" tests="2" skipped="1" failures="0" errors="1">
              <testcase name="t1" classname="{class}" time="0.5"><error type="IOError">disk full</error></testcase>
              <testcase name="t2" classname="{class}" time="0.1"/>
            </testsuite>
        "#, suite = suite, class = class}
    }

    fn all_details() -> AggregateOptions {
        let mut options = AggregateOptions::new();
        options.set_failure_details(true).set_error_details(true);
        options
    }

    #[test]
    fn totals_are_declared_counts() {
        let mut aggregator = Aggregator::new(all_details());
        aggregator.add_testsuites(suites(indoc! {r#"
            <testsuites>
              <testsuite name="S1" tests="7" skipped="1" failures="2" errors="0"/>
              <testsuite name="S2" tests="3" skipped="0" failures="0" errors="5">
                <testcase name="t" classname="A" time="0"/>
              </testsuite>
            </testsuites>
        "#}));

        assert_eq!(
            aggregator.summary().totals,
            Totals {
                tests: 10,
                skipped: 1,
                failures: 2,
                errors: 5,
            }
        );
        assert!(aggregator.summary().failures_by_class.is_empty());
    }

    #[test]
    fn totals_saturate() {
        let input = formatdoc! {r#"
            <testsuites>
              <testsuite name="S1" tests="{max}" skipped="0" failures="2" errors="0"/>
              <testsuite name="S2" tests="1" skipped="0" failures="{max}" errors="0"/>
            </testsuites>
        "#, max = usize::MAX};

        let mut aggregator = Aggregator::new(AggregateOptions::new());
        aggregator.add_testsuites(suites(&input));

        assert_eq!(
            aggregator.summary().totals,
            Totals {
                tests: usize::MAX,
                skipped: 0,
                failures: usize::MAX,
                errors: 0,
            }
        );
    }

    #[test]
    fn same_class_across_reports_keeps_both() {
        let mut aggregator = Aggregator::new(all_details());
        aggregator.add_testsuites(suites(&error_report("B", "first")));
        aggregator.add_testsuites(suites(&error_report("B", "second")));

        let summary = aggregator.finish();
        assert_eq!(summary.totals.errors, 2);
        assert_eq!(summary.totals.tests, 4);
        assert_eq!(summary.totals.skipped, 2);

        let errors = &summary.errors_by_class["B"];
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|error| error.content == "disk full"));
    }

    #[test]
    fn merge_is_order_independent_for_disjoint_classes() {
        let report_a = suites(&error_report("A", "a"));
        let report_b = suites(&error_report("B", "b"));

        let mut forward = Aggregator::new(all_details());
        forward
            .add_testsuites(report_a.clone())
            .add_testsuites(report_b.clone());

        let mut backward = Aggregator::new(all_details());
        backward.add_testsuites(report_b).add_testsuites(report_a);

        assert_eq!(forward.finish(), backward.finish());
    }

    #[test]
    fn details_are_only_collected_on_request() {
        let input = indoc! {r#"
            <testsuite name="S" tests="2" skipped="0" failures="1" errors="1">
              <testcase name="t1" classname="A" time="0"><failure message="m" type="T">f</failure></testcase>
              <testcase name="t2" classname="A" time="0"><error type="E">e</error></testcase>
            </testsuite>
        "#};

        let mut options = AggregateOptions::new();
        options.set_failure_details(true);
        let mut aggregator = Aggregator::new(options);
        aggregator.add_testsuites(suites(input));
        let summary = aggregator.finish();
        assert_eq!(summary.failures_by_class["A"].len(), 1);
        assert!(summary.errors_by_class.is_empty());

        let mut aggregator = Aggregator::new(AggregateOptions::new());
        aggregator.add_testsuites(suites(input));
        let summary = aggregator.finish();
        assert!(summary.failures_by_class.is_empty());
        assert!(summary.errors_by_class.is_empty());
        assert_eq!(summary.totals.failures, 1);
        assert_eq!(summary.totals.errors, 1);
    }

    #[test]
    fn no_reports() {
        let summary = Aggregator::new(all_details())
            .aggregate(Vec::<Utf8PathBuf>::new())
            .expect("no reports to fail on");
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn malformed_report_aborts() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let good = dir.path().join("good.xml");
        let bad = dir.path().join("bad.xml");
        std::fs::write(&good, error_report("B", "good")).expect("wrote good report");
        std::fs::write(
            &bad,
            r#"<testsuite name="S" tests="1" skipped="0" failures="0" errors="0"><testcase name="t" time="0"/></testsuite>"#,
        )
        .expect("wrote bad report");

        let err = Aggregator::new(all_details())
            .aggregate([&good, &bad])
            .expect_err("bad report aborts the run");
        assert_eq!(err.path(), bad.as_path());
        assert!(matches!(err, ReportError::Malformed(_)), "{err:?}");
    }

    #[test]
    fn malformed_report_skipped() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let good = dir.path().join("good.xml");
        let bad = dir.path().join("bad.xml");
        let missing = dir.path().join("missing.xml");
        std::fs::write(&good, error_report("B", "good")).expect("wrote good report");
        std::fs::write(&bad, "<testsuite").expect("wrote bad report");

        let mut options = all_details();
        options.set_on_malformed(MalformedPolicy::Skip);
        let summary = Aggregator::new(options)
            .aggregate([&bad, &good, &missing])
            .expect("bad reports are skipped");

        assert_eq!(summary.reports_read, 1);
        assert_eq!(summary.skipped_reports, vec![bad, missing]);
        assert_eq!(summary.totals.errors, 1);
        assert_eq!(summary.errors_by_class["B"].len(), 1);
    }

    #[test]
    fn display_error_chain() {
        let err = parse_report(
            r#"<testsuite name="S" tests="x" skipped="0" failures="0" errors="0"/>"#.as_bytes(),
            Utf8Path::new("a.xml"),
        )
        .expect_err("count is invalid");
        assert_eq!(
            DisplayErrorChain(&err).to_string(),
            "malformed JUnit report `a.xml`: attribute `tests` of <testsuite> must be a \
             non-negative integer, found `x`: invalid digit found in string"
        );
    }
}
