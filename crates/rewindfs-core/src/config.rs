// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration surface consumed by the model core
//!
//! The host decides which paths are fully modeled, which writes are dropped,
//! and how a delete of a still-open file is treated. The core only consumes
//! these plain-data policies; parsing/merging them is the host's concern.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Coverage decision for a canonical path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageMode {
    /// Fully modeled: writes go to the chunk chain, state is backtrackable.
    Modeled,
    /// Writes report success and are dropped; reads answered natively.
    WriteIgnored,
    /// Unmodeled passthrough: reads and writes hit the native source.
    Excluded,
}

impl Default for CoverageMode {
    fn default() -> Self {
        CoverageMode::Modeled
    }
}

/// Reaction when a path with a positive open count is deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOpenPolicy {
    Ignore,
    Warn,
    Error,
}

impl Default for DeleteOpenPolicy {
    fn default() -> Self {
        DeleteOpenPolicy::Warn
    }
}

/// Individual rule binding a path pattern to a coverage mode.
///
/// Patterns are canonical-path literals with an optional single trailing
/// `*` wildcard, e.g. `/tmp/*` or `/etc/passwd`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathRule {
    pub pattern: String,
    pub mode: CoverageMode,
}

impl PathRule {
    pub fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == self.pattern,
        }
    }
}

/// Model configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct FsConfig {
    /// First matching rule wins; unmatched paths are `Modeled`.
    #[serde(default)]
    pub coverage: Vec<PathRule>,
    #[serde(default)]
    pub delete_open: DeleteOpenPolicy,
    /// Directory for the write-cache payload blobs. `None` keeps payloads
    /// in process memory.
    #[serde(default)]
    pub write_cache_dir: Option<PathBuf>,
}

impl FsConfig {
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn coverage_for(&self, path: &str) -> CoverageMode {
        self.coverage
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.mode)
            .unwrap_or_default()
    }
}
