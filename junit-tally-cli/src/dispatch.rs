// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line options and the top-level run.

use crate::{
    ExpectedError, Result,
    config::{OnMalformed, ReportConfig, TallyConfig},
    discover::ReportDiscovery,
    display::SummaryDisplay,
    errors::InputNotFoundReason,
    exit_codes::TallyExitCode,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use junit_tally::{AggregateOptions, Aggregator};

const AFTER_LONG_HELP: &str = "\
-----------------------------------------------
PARSE JUNIT XML RESULT FROM PROVIDED RESULT DIR
-----------------------------------------------

    Usage template: junit-tally -d <JUNIT_XML_RESULT_DIR> --show-error-message --show-failed-message

    <JUNIT_XML_RESULT_DIR>

        The directory containing JUnit XML reports. It is searched recursively.

    --show-error-message

        Also print the tests that errored, grouped by class, with their error type and output.

    --show-failed-message

        Also print the tests that failed, grouped by class, with their message, type and output.
";

/// Summarize the JUnit XML reports found under a directory.
///
/// Prints the total number of test cases, failures, skipped tests and errors declared by every
/// report, and optionally the failed and errored tests grouped by class.
#[derive(Debug, clap::Parser)]
#[command(
    name = "junit-tally",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
    after_long_help = AFTER_LONG_HELP,
)]
pub struct TallyApp {
    #[clap(flatten)]
    report_opts: ReportOpts,

    #[clap(flatten)]
    config_opts: ConfigOpts,

    #[clap(flatten)]
    output: OutputOpts,
}

/// Options selecting and summarizing reports.
#[derive(Debug, Args)]
struct ReportOpts {
    /// Directory to search for JUnit XML reports
    #[arg(short = 'd', long, value_name = "DIR", env = "JUNIT_TALLY_DIR")]
    dir: Option<Utf8PathBuf>,

    /// Show failed tests, grouped by class
    #[arg(long)]
    show_failed_message: bool,

    /// Show errored tests, grouped by class
    #[arg(long)]
    show_error_message: bool,

    /// Only read reports whose file name matches this glob [default: *.xml]
    #[arg(long, value_name = "GLOB")]
    pattern: Option<String>,

    /// What to do with a report that can't be read or parsed [default: abort]
    #[arg(long, value_enum, value_name = "POLICY")]
    on_malformed: Option<OnMalformed>,
}

/// Configuration options.
#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Config file [default: .config/junit-tally.toml in the current directory]
    #[arg(long, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

/// Settings for a run, after the command line has been layered over the config.
#[derive(Clone, Debug, Eq, PartialEq)]
struct TallySettings {
    pattern: String,
    options: AggregateOptions,
}

impl TallySettings {
    fn resolve(opts: &ReportOpts, config: &ReportConfig) -> Self {
        let pattern = opts
            .pattern
            .clone()
            .unwrap_or_else(|| config.pattern.clone());
        let on_malformed = opts.on_malformed.unwrap_or(config.on_malformed);

        let mut options = AggregateOptions::new();
        options
            .set_failure_details(opts.show_failed_message || config.show_failures)
            .set_error_details(opts.show_error_message || config.show_errors)
            .set_on_malformed(on_malformed.into());

        Self { pattern, options }
    }
}

impl TallyApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        self.exec_in(Utf8Path::new("."), output, output_writer)
    }

    /// Executes the app, looking for the default config file under `base_dir`.
    fn exec_in(
        self,
        base_dir: &Utf8Path,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32> {
        let config = TallyConfig::from_sources(base_dir, self.config_opts.config_file.as_deref())?;
        let settings = TallySettings::resolve(&self.report_opts, &config.report);
        let dir = check_dir(self.report_opts.dir)?;

        let discovery = ReportDiscovery::new(dir, &settings.pattern)?;
        let paths = discovery.discover();
        tracing::debug!(
            "found {} reports matching `{}` under `{}`",
            paths.len(),
            settings.pattern,
            discovery.root(),
        );

        let summary = Aggregator::new(settings.options).aggregate(&paths)?;

        let mut writer = output_writer.stdout_writer();
        SummaryDisplay::new(
            &summary,
            settings.options.failure_details,
            settings.options.error_details,
        )
        .with_styles(output.stdout_styles())
        .write_to(&mut writer)
        .map_err(ExpectedError::write_output_error)?;

        if !summary.skipped_reports.is_empty() {
            tracing::warn!(
                "{} of {} reports were skipped because they could not be read or parsed",
                summary.skipped_reports.len(),
                paths.len(),
            );
            for path in &summary.skipped_reports {
                tracing::warn!(target: "junit_tally_cli::no_heading", "  {path}");
            }
        }

        Ok(TallyExitCode::OK)
    }
}

fn check_dir(dir: Option<Utf8PathBuf>) -> Result<Utf8PathBuf> {
    let dir =
        dir.ok_or_else(|| ExpectedError::input_not_found(InputNotFoundReason::NotSupplied))?;
    if !dir.exists() {
        return Err(ExpectedError::input_not_found(
            InputNotFoundReason::Missing { dir },
        ));
    }
    if !dir.is_dir() {
        return Err(ExpectedError::input_not_found(
            InputNotFoundReason::NotADirectory { dir },
        ));
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use clap::{CommandFactory, Parser};
    use indoc::indoc;
    use junit_tally::MalformedPolicy;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const PASSING: &str = indoc! {r#"
        <testsuite name="S1" tests="2" skipped="0" failures="0" errors="0">
            <testcase name="t1" classname="A" time="0.1"/>
            <testcase name="t2" classname="A" time="0.2"/>
        </testsuite>
    "#};

    const FAILING: &str = indoc! {r#"
        <testsuite name="S2" tests="2" skipped="1" failures="1" errors="0">
            <testcase name="t3" classname="B" time="0.3"><failure message="boom" type="AssertionError">trace</failure></testcase>
            <testcase name="t4" classname="B" time="0.0"><skipped/></testcase>
        </testsuite>
    "#};

    fn output() -> OutputContext {
        OutputContext {
            color: Color::Never,
        }
    }

    fn write(dir: &Utf8TempDir, rel: &str, contents: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("created parent");
        }
        std::fs::write(&path, contents).expect("wrote file");
    }

    fn run(dir: &Utf8TempDir, args: &[&str]) -> (Result<i32>, String) {
        let app = TallyApp::parse_from(
            ["junit-tally", "--dir", dir.path().as_str()]
                .into_iter()
                .chain(args.iter().copied()),
        );
        let mut writer = OutputWriter::new_test();
        let result = app.exec_in(dir.path(), output(), &mut writer);
        let stdout = writer.stdout().expect("stdout is captured").to_owned();
        (result, stdout)
    }

    #[test]
    fn verify_app() {
        TallyApp::command().debug_assert();
    }

    #[test]
    fn totals() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "passing.xml", PASSING);
        write(&dir, "nested/failing.xml", FAILING);
        write(&dir, "nested/ignored.txt", "not a report");

        let (result, stdout) = run(&dir, &[]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert_eq!(
            stdout,
            "Total test cases 4, failures 1, skipped 1, errors 0\n"
        );
    }

    #[test]
    fn failure_details() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "failing.xml", FAILING);

        let (result, stdout) = run(&dir, &["--show-failed-message"]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert!(
            stdout.contains(
                "Failure case B::t3 (time 0.3s), message: boom, type: AssertionError\ntrace\n\n"
            ),
            "unexpected output:\n{stdout}"
        );
    }

    #[test]
    fn empty_directory() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let (result, stdout) = run(&dir, &["--show-failed-message", "--show-error-message"]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert_eq!(
            stdout,
            "Total test cases 0, failures 0, skipped 0, errors 0\n\n"
        );
    }

    #[test]
    fn malformed_report_aborts() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "a.xml", PASSING);
        write(&dir, "b.xml", "<testsuite name=\"S\" tests=\"1\">");

        let (result, stdout) = run(&dir, &[]);
        let err = result.expect_err("malformed report aborts the run");
        assert_eq!(err.process_exit_code(), TallyExitCode::MALFORMED_REPORT);
        assert_eq!(stdout, "", "no totals are printed");
    }

    #[test]
    fn malformed_report_skipped() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "a.xml", PASSING);
        write(&dir, "b.xml", "<testsuite name=\"S\" tests=\"1\">");

        let (result, stdout) = run(&dir, &["--on-malformed", "skip"]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert_eq!(
            stdout,
            "Total test cases 2, failures 0, skipped 0, errors 0\n"
        );
    }

    #[test]
    fn config_file_is_layered() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "reports/TEST-failing.xml", FAILING);
        write(&dir, "reports/passing.xml", PASSING);
        write(
            &dir,
            ".config/junit-tally.toml",
            "[report]\npattern = \"TEST-*.xml\"\nshow-failures = true\n",
        );

        let (result, stdout) = run(&dir, &[]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert!(
            stdout.starts_with("Total test cases 2, failures 1, skipped 1, errors 0\n\n"),
            "unexpected output:\n{stdout}"
        );
        assert!(stdout.contains("Failure cases in class B\n"));

        // The command line wins over the config file.
        let (result, stdout) = run(&dir, &["--pattern", "*.xml"]);
        assert_eq!(result.expect("run succeeds"), TallyExitCode::OK);
        assert!(stdout.starts_with("Total test cases 4, failures 1, skipped 1, errors 0\n\n"));
    }

    #[test]
    fn invalid_config() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, ".config/junit-tally.toml", "[report]\non-malformed = 3\n");

        let (result, _) = run(&dir, &[]);
        let err = result.expect_err("config is invalid");
        assert_eq!(err.process_exit_code(), TallyExitCode::SETUP_ERROR);
    }

    #[test]
    fn invalid_pattern() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let (result, _) = run(&dir, &["--pattern", "[xml"]);
        let err = result.expect_err("pattern is invalid");
        assert_eq!(err.process_exit_code(), TallyExitCode::SETUP_ERROR);
    }

    #[test_case(None ; "not supplied")]
    #[test_case(Some("missing") ; "missing")]
    #[test_case(Some("file.xml") ; "not a directory")]
    fn input_not_found(dir_arg: Option<&str>) {
        let dir = Utf8TempDir::new().expect("created temp dir");
        write(&dir, "file.xml", PASSING);

        let mut args = vec!["junit-tally".to_owned()];
        if let Some(dir_arg) = dir_arg {
            args.push("--dir".to_owned());
            args.push(dir.path().join(dir_arg).into_string());
        }
        let mut app = TallyApp::parse_from(args);
        if dir_arg.is_none() {
            // Don't pick up JUNIT_TALLY_DIR from the environment running the tests.
            app.report_opts.dir = None;
        }

        let mut writer = OutputWriter::new_test();
        let err = app
            .exec_in(dir.path(), output(), &mut writer)
            .expect_err("input is not usable");
        assert_eq!(err.process_exit_code(), TallyExitCode::INPUT_NOT_FOUND);
    }

    #[test]
    fn settings_resolution() {
        let config = ReportConfig {
            pattern: "*.xml".to_owned(),
            show_failures: true,
            show_errors: false,
            on_malformed: OnMalformed::Skip,
        };

        let app = TallyApp::parse_from(["junit-tally", "--show-error-message"]);
        let settings = TallySettings::resolve(&app.report_opts, &config);
        assert_eq!(settings.pattern, "*.xml");
        assert!(settings.options.failure_details);
        assert!(settings.options.error_details);
        assert_eq!(settings.options.on_malformed, MalformedPolicy::Skip);

        let app = TallyApp::parse_from([
            "junit-tally",
            "--pattern",
            "TEST-*.xml",
            "--on-malformed",
            "abort",
        ]);
        let settings = TallySettings::resolve(&app.report_opts, &config);
        assert_eq!(settings.pattern, "TEST-*.xml");
        assert_eq!(settings.options.on_malformed, MalformedPolicy::Abort);
    }
}
