// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::SummaryStyles;
use junit_tally::{Summary, Testcase};
use owo_colors::OwoColorize;
use std::{fmt, io};

const BANNER_WIDTH: usize = 78;

/// Writes a [`Summary`] for humans.
#[derive(Clone, Debug)]
pub(crate) struct SummaryDisplay<'a> {
    summary: &'a Summary,
    show_failures: bool,
    show_errors: bool,
    styles: SummaryStyles,
}

impl<'a> SummaryDisplay<'a> {
    pub(crate) fn new(summary: &'a Summary, show_failures: bool, show_errors: bool) -> Self {
        Self {
            summary,
            show_failures,
            show_errors,
            styles: SummaryStyles::default(),
        }
    }

    pub(crate) fn with_styles(mut self, styles: SummaryStyles) -> Self {
        self.styles = styles;
        self
    }

    pub(crate) fn write_to(&self, writer: &mut dyn io::Write) -> io::Result<()> {
        let totals = &self.summary.totals;
        writeln!(
            writer,
            "Total test cases {}, failures {}, skipped {}, errors {}",
            totals.tests.style(self.styles.count),
            totals.failures.style(self.styles.count),
            totals.skipped.style(self.styles.count),
            totals.errors.style(self.styles.count),
        )?;

        if self.show_failures || self.show_errors {
            writeln!(writer)?;
        }

        if self.show_failures {
            for (classname, failures) in &self.summary.failures_by_class {
                if failures.is_empty() {
                    continue;
                }
                self.write_class_banner(writer, "Failure", classname)?;
                for failure in failures {
                    writeln!(
                        writer,
                        "{} case {}, message: {}, type: {}",
                        "Failure".style(self.styles.fail),
                        DisplayCase(&failure.testcase).style(self.styles.case),
                        failure.message,
                        failure.ty,
                    )?;
                    write_content(writer, &failure.content)?;
                }
            }
        }

        if self.show_errors {
            for (classname, errors) in &self.summary.errors_by_class {
                if errors.is_empty() {
                    continue;
                }
                self.write_class_banner(writer, "Error", classname)?;
                for error in errors {
                    writeln!(
                        writer,
                        "{} case {}, type: {}",
                        "Error".style(self.styles.fail),
                        DisplayCase(&error.testcase).style(self.styles.case),
                        error.ty,
                    )?;
                    write_content(writer, &error.content)?;
                }
            }
        }

        writer.flush()
    }

    fn write_class_banner(
        &self,
        writer: &mut dyn io::Write,
        kind: &str,
        classname: &str,
    ) -> io::Result<()> {
        let banner = "=".repeat(BANNER_WIDTH);
        writeln!(writer, "{banner}")?;
        writeln!(
            writer,
            "{kind} cases in class {}",
            classname.style(self.styles.class)
        )?;
        writeln!(writer, "{banner}")
    }
}

/// Writes the element content verbatim, then a blank line.
fn write_content(writer: &mut dyn io::Write, content: &str) -> io::Result<()> {
    if !content.is_empty() {
        write!(writer, "{content}")?;
        if !content.ends_with('\n') {
            writeln!(writer)?;
        }
    }
    writeln!(writer)
}

struct DisplayCase<'a>(&'a Testcase);

impl fmt::Display for DisplayCase<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (time {}s)", self.0.key(), self.0.time)
    }
}
