// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for junit-tally, layered from an embedded default, an optional config file and
//! the command line.

use crate::errors::ConfigParseError;
use camino::{Utf8Path, Utf8PathBuf};
use clap::ValueEnum;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use junit_tally::MalformedPolicy;
use serde::Deserialize;
use std::collections::BTreeSet;

/// What to do with a report that can't be read or parsed, as written in config files and on the
/// command line.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OnMalformed {
    /// Stop at the first bad report.
    #[default]
    Abort,

    /// Warn about bad reports and leave them out of the summary.
    Skip,
}

impl From<OnMalformed> for MalformedPolicy {
    fn from(value: OnMalformed) -> Self {
        match value {
            OnMalformed::Abort => MalformedPolicy::Abort,
            OnMalformed::Skip => MalformedPolicy::Skip,
        }
    }
}

/// The `[report]` table.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReportConfig {
    /// The glob that report file names are matched against.
    pub pattern: String,

    /// Whether to print failures by class.
    pub show_failures: bool,

    /// Whether to print errors by class.
    pub show_errors: bool,

    /// What to do with bad reports.
    pub on_malformed: OnMalformed,
}

/// Overall configuration for junit-tally.
///
/// This is the root data structure for junit-tally configuration. Values are read from the
/// default config embedded in the binary, overlaid with `.config/junit-tally.toml` (or the file
/// passed in with `--config-file`).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct TallyConfig {
    /// Settings for finding and summarizing reports.
    pub report: ReportConfig,
}

impl TallyConfig {
    /// The default location of the config within a directory: `.config/junit-tally.toml`.
    pub const CONFIG_PATH: &'static str = ".config/junit-tally.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from `config_file` if specified, or from `.config/junit-tally.toml`
    /// under `base_dir` if it exists.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_sources(
        base_dir: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = base_dir.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|err| ConfigParseError::new(&config_file, err))?;

        for key in &unknown {
            tracing::warn!("ignoring unknown configuration key `{key}` in `{config_file}`");
        }
        tracing::debug!("loaded config: {config:?}");

        Ok(config)
    }

    /// Returns the default config, without any files layered on top.
    pub fn default_config() -> Result<Self, ConfigParseError> {
        let (config, _unknown) = Self::build_and_deserialize_config(&Self::make_default_config())
            .map_err(|err| ConfigParseError::new(Utf8PathBuf::from("<default config>"), err))?;
        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigError> {
        let config = builder.build_cloned()?;

        let mut ignored = BTreeSet::new();
        let config: Self = serde_ignored::deserialize(config, |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        })?;

        Ok((config, ignored))
    }
}
