//! Engine configuration.
//!
//! [`EngineConfig`] collects the knobs that are fixed for the lifetime of a
//! hashing session: digest algorithm, the full-hash threshold, buffer sizing,
//! exclusion rules, and parallelism. It can be loaded from a TOML file; CLI
//! flags override individual fields on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Percentage of a file the sample may cover before full hashing is forced.
///
/// Sampling 5 MB out of a 7 MB file saves nothing over streaming all 7 MB,
/// and the full digest is strictly more trustworthy.
pub const DEFAULT_FULL_HASH_THRESHOLD_PCT: u64 = 50;

/// Full-mode buffer size when the request does not carry a chunk size.
pub const DEFAULT_BUFFER_KIB: u32 = 64;

/// Path substrings excluded from directory enumeration out of the box:
/// OS trash and volume metadata directories.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["$RECYCLE.BIN", "System Volume Information"];

/// Session-wide engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Digest algorithm name (`sha256` or `blake3`).
    pub algorithm: String,

    /// Sampling is demoted to a full stream when it would cover more than
    /// this percentage of a file.
    pub full_hash_threshold_pct: u64,

    /// Buffer size in KiB for full-mode requests that do not specify one.
    pub buffer_kib: u32,

    /// Canonical-path substrings whose matches are skipped during directory
    /// enumeration.
    pub exclude: Vec<String>,

    /// Hash the children of each directory on a thread pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            algorithm: "sha256".to_string(),
            full_hash_threshold_pct: DEFAULT_FULL_HASH_THRESHOLD_PCT,
            buffer_kib: DEFAULT_BUFFER_KIB,
            exclude: DEFAULT_EXCLUSIONS.iter().map(ToString::to_string).collect(),
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Set the digest algorithm name.
    #[must_use]
    pub fn with_algorithm(mut self, name: impl Into<String>) -> Self {
        self.algorithm = name.into();
        self
    }

    /// Enable or disable parallel child hashing.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Add exclusion substrings on top of the configured ones.
    #[must_use]
    pub fn with_extra_exclusions(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(extra);
        self
    }
}

/// Injectable list of path predicates deciding which children a directory
/// walk never schedules.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    substrings: Vec<String>,
}

impl ExclusionRules {
    #[must_use]
    pub fn new(substrings: Vec<String>) -> Self {
        Self { substrings }
    }

    /// Whether the canonical path matches any exclusion.
    #[must_use]
    pub fn is_excluded(&self, canonical: &Path) -> bool {
        let path = canonical.to_string_lossy();
        self.substrings.iter().any(|needle| path.contains(needle.as_str()))
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().map(ToString::to_string).collect())
    }
}

impl From<&EngineConfig> for ExclusionRules {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.exclude.clone())
    }
}
