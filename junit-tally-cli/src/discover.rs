// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::InvalidPattern;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobMatcher};
use walkdir::WalkDir;

/// Finds report files under a directory.
#[derive(Clone, Debug)]
pub struct ReportDiscovery {
    root: Utf8PathBuf,
    matcher: GlobMatcher,
}

impl ReportDiscovery {
    /// Creates a new discovery for files under `root` whose file name matches `pattern`.
    pub fn new(root: impl Into<Utf8PathBuf>, pattern: &str) -> Result<Self, InvalidPattern> {
        let matcher = Glob::new(pattern)
            .map_err(|err| InvalidPattern::new(pattern, err))?
            .compile_matcher();
        Ok(Self {
            root: root.into(),
            matcher,
        })
    }

    /// Returns the directory being searched.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Walks the directory and returns the paths of all matching files.
    ///
    /// Entries are visited in file name order within each directory, so the result is the same
    /// across runs. Entries that can't be read, and paths that aren't valid UTF-8, are skipped
    /// with a warning.
    pub fn discover(&self) -> Vec<Utf8PathBuf> {
        let mut paths = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry under `{}`: {err}", self.root);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.matcher.is_match(entry.file_name()) {
                continue;
            }

            match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(path) => {
                    tracing::debug!("found report `{path}`");
                    paths.push(path);
                }
                Err(path) => {
                    tracing::warn!("skipping report with non-UTF-8 path `{}`", path.display());
                }
            }
        }

        paths
    }
}
