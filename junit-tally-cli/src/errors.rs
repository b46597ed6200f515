// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{exit_codes::TallyExitCode, output::StderrStyles};
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use junit_tally::ReportError;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// An error that occurred while loading a config file.
#[derive(Debug, Error)]
#[error("failed to parse junit-tally config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }
}

/// A report file name pattern that is not a valid glob.
#[derive(Debug, Error)]
#[error("invalid report pattern `{pattern}`")]
pub struct InvalidPattern {
    pattern: String,
    #[source]
    err: globset::Error,
}

impl InvalidPattern {
    pub(crate) fn new(pattern: impl Into<String>, err: globset::Error) -> Self {
        Self {
            pattern: pattern.into(),
            err,
        }
    }
}

/// Why the report directory could not be used.
#[derive(Debug)]
#[doc(hidden)]
pub enum InputNotFoundReason {
    NotSupplied,
    Missing { dir: Utf8PathBuf },
    NotADirectory { dir: Utf8PathBuf },
}

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error, reported to the user with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("report directory not found")]
    InputNotFound { reason: InputNotFoundReason },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("invalid report pattern")]
    InvalidPattern {
        #[from]
        err: InvalidPattern,
    },
    #[error("report error")]
    ReportError {
        #[from]
        err: ReportError,
    },
    #[error("error writing output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    pub(crate) fn input_not_found(reason: InputNotFoundReason) -> Self {
        Self::InputNotFound { reason }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::InputNotFound { .. } => TallyExitCode::INPUT_NOT_FOUND,
            Self::ConfigParseError { .. } | Self::InvalidPattern { .. } => {
                TallyExitCode::SETUP_ERROR
            }
            Self::ReportError { .. } => TallyExitCode::MALFORMED_REPORT,
            Self::WriteOutputError { .. } => TallyExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::InputNotFound { reason } => {
                match reason {
                    InputNotFoundReason::NotSupplied => {
                        tracing::error!(
                            "no report directory supplied (pass {} or set {})",
                            "--dir".style(styles.bold),
                            "JUNIT_TALLY_DIR".style(styles.bold),
                        );
                    }
                    InputNotFoundReason::Missing { dir } => {
                        tracing::error!(
                            "report directory `{}` does not exist",
                            dir.style(styles.bold)
                        );
                    }
                    InputNotFoundReason::NotADirectory { dir } => {
                        tracing::error!(
                            "report path `{}` is not a directory",
                            dir.style(styles.bold)
                        );
                    }
                }
                None
            }
            Self::ConfigParseError { err } => {
                tracing::error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::InvalidPattern { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::ReportError { err } => match err {
                ReportError::Read { path, .. } => {
                    tracing::error!("failed to read report `{}`", path.style(styles.bold));
                    err.source()
                }
                ReportError::Malformed(malformed) => {
                    tracing::error!("malformed report `{}`", malformed.path().style(styles.bold));
                    malformed.source()
                }
            },
            Self::WriteOutputError { err } => {
                tracing::error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "junit_tally_cli::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use junit_tally::parse_report;
    use std::io;

    #[test]
    fn exit_codes() {
        let not_found = ExpectedError::input_not_found(InputNotFoundReason::NotSupplied);
        assert_eq!(
            not_found.process_exit_code(),
            TallyExitCode::INPUT_NOT_FOUND
        );

        let write = ExpectedError::write_output_error(io::Error::other("broken pipe"));
        assert_eq!(
            write.process_exit_code(),
            TallyExitCode::WRITE_OUTPUT_ERROR
        );

        let pattern = globset::Glob::new("[").expect_err("unclosed class is invalid");
        let pattern: ExpectedError = InvalidPattern::new("[", pattern).into();
        assert_eq!(pattern.process_exit_code(), TallyExitCode::SETUP_ERROR);

        let malformed = parse_report(
            &b"<testsuite name=\"s\" tests=\"1\" skipped=\"0\" failures=\"0\" errors=\"0\">"[..],
            Utf8Path::new("unclosed.xml"),
        )
        .expect_err("document is unclosed");
        let malformed: ExpectedError = malformed.into();
        assert_eq!(
            malformed.process_exit_code(),
            TallyExitCode::MALFORMED_REPORT
        );
    }
}
