//! Content digest engines.
//!
//! This module holds everything that turns bytes on disk into digests:
//!
//! - [`Digest`]: the fixed-width digest value with bytewise ordering
//! - [`Sampling`]: the chunk-sampling policy attached to every request
//! - [`sampled`]: single-file digestion (full stream or sparse chunks)
//! - [`tree`]: recursive directory digestion with order-independent folding
//! - [`cache`]: session memoization shared by both engines
//!
//! # Example
//!
//! ```no_run
//! use treedupe::config::EngineConfig;
//! use treedupe::hasher::{Sampling, TreeHasher};
//! use std::path::Path;
//!
//! let engine = TreeHasher::new(&EngineConfig::default()).unwrap();
//! let digest = engine
//!     .hash_path(Path::new("/data"), Sampling::Sampled { chunk_kb: 50, chunks: 10 })
//!     .unwrap();
//! println!("{digest}");
//! ```

pub mod cache;
pub mod sampled;
pub mod tree;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::Digest as _;

pub use cache::DigestCache;
pub use tree::TreeHasher;

/// Width of every digest value in bytes.
pub const DIGEST_LEN: usize = 32;

/// A fixed-width content digest.
///
/// Equality is byte-exact. Ordering is lexicographic by unsigned byte value,
/// most significant byte first, which is exactly the derived ordering on the
/// inner array; the directory fold relies on this total order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Digest assigned to a directory with no eligible children.
    pub const EMPTY_TREE: Digest = Digest([0u8; DIGEST_LEN]);

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Uppercase hexadecimal, two characters per byte, no separators.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write as _;
        let mut out = String::with_capacity(DIGEST_LEN * 2);
        for byte in self.0 {
            let _ = write!(out, "{byte:02X}");
        }
        out
    }

    /// First six hex characters, used to tag duplicate-set members.
    #[must_use]
    pub fn short_hex(&self) -> String {
        self.to_hex()[..6].to_string()
    }

    /// Parse a 64-character hex string (either case).
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Digest> {
        if hex.len() != DIGEST_LEN * 2 || !hex.is_ascii() {
            return None;
        }
        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Digest(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Digest(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// The digest functions the engines can be constructed with.
///
/// Both produce 256-bit output. SHA-256 is the default; BLAKE3 is markedly
/// faster on large trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Resolve an algorithm from its configured name.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::UnsupportedAlgorithm`] for any name other than
    /// `sha256`/`sha-256` or `blake3`.
    pub fn from_name(name: &str) -> Result<Self, HashError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(HashError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental digest state for one computation.
pub(crate) enum Digester {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Digester {
    pub(crate) fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub(crate) fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(state) => state.update(bytes),
            Self::Blake3(state) => {
                state.update(bytes);
            }
        }
    }

    pub(crate) fn finalize(self) -> Digest {
        match self {
            Self::Sha256(state) => {
                let bytes: [u8; DIGEST_LEN] = state.finalize().into();
                Digest(bytes)
            }
            Self::Blake3(state) => Digest(*state.finalize().as_bytes()),
        }
    }
}

/// The sampling policy attached to a digest request.
///
/// The policy is part of the digest's identity: the same file digested under
/// two different policies yields two distinct cache entries, because the
/// digest value depends on which bytes were read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sampling {
    /// Stream the entire file. Renders as `FULL:0` in keys and dumps.
    Full,
    /// Read `chunks + 2` evenly spaced windows of `chunk_kb` KiB each (one
    /// window pinned to the start, one effectively at the end).
    Sampled { chunk_kb: u32, chunks: u32 },
}

impl Sampling {
    /// Build a policy from the raw integer contract: `chunk_count == -1`
    /// selects full hashing (where `chunk_size_kb` of `-1` or `0` means "any
    /// convenient buffer size").
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `chunk_count < -1`, `chunk_size_kb < -1`, or a
    /// sampled request carries a non-positive chunk size.
    pub fn from_raw(chunk_size_kb: i64, chunk_count: i64) -> Result<Self, HashError> {
        if chunk_count < -1 {
            return Err(HashError::InvalidArgument(format!(
                "chunk count must be positive or -1, not {chunk_count}"
            )));
        }
        if chunk_size_kb < -1 {
            return Err(HashError::InvalidArgument(format!(
                "chunk size must be positive or -1, not {chunk_size_kb}"
            )));
        }
        if chunk_count == -1 {
            return Ok(Self::Full);
        }
        if chunk_size_kb <= 0 {
            return Err(HashError::InvalidArgument(format!(
                "sampled hashing needs a positive chunk size, not {chunk_size_kb}"
            )));
        }
        let chunk_kb = u32::try_from(chunk_size_kb).map_err(|_| {
            HashError::InvalidArgument(format!("chunk size {chunk_size_kb} KiB is out of range"))
        })?;
        let chunks = u32::try_from(chunk_count).map_err(|_| {
            HashError::InvalidArgument(format!("chunk count {chunk_count} is out of range"))
        })?;
        Ok(Self::Sampled { chunk_kb, chunks })
    }

    #[must_use]
    pub fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Parse the two key fields of a dump line (`FULL`/`0` or `{kb}`/`{count}`).
    #[must_use]
    pub fn parse_fields(first: &str, second: &str) -> Option<Self> {
        if first == "FULL" {
            return (second == "0").then_some(Self::Full);
        }
        let chunk_kb = first.parse().ok()?;
        let chunks = second.parse().ok()?;
        Some(Self::Sampled { chunk_kb, chunks })
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("FULL:0"),
            Self::Sampled { chunk_kb, chunks } => write!(f, "{chunk_kb}:{chunks}"),
        }
    }
}

/// Identity of one digest computation: the *effective* sampling policy plus
/// the canonical path it was applied to.
///
/// Canonicalization means one physical file maps to one key no matter how it
/// was reached; the structured fields replace the colon-joined strings the
/// dump format is built from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    pub sampling: Sampling,
    pub path: PathBuf,
}

impl CacheKey {
    #[must_use]
    pub fn new(sampling: Sampling, path: PathBuf) -> Self {
        Self { sampling, path }
    }

    /// The dump-format key: `{sampling}:{path}`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}:{}", self.sampling, self.path.display())
    }
}

/// One completed digest computation, as collected for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedEntry {
    pub digest: Digest,
    pub key: CacheKey,
}

impl HashedEntry {
    /// The dump line: `HEXDIGEST:{sampling}:{path}`.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}:{}", self.digest.to_hex(), self.key.render())
    }
}

/// Errors produced by the digest engines.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Bad sampling parameters, or a path that is neither a regular file nor
    /// a directory.
    #[error("invalid hashing request: {0}")]
    InvalidArgument(String),

    /// The path does not exist (or vanished between check and read).
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while reading a file or listing a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The digest algorithm name given at construction is not known.
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl HashError {
    /// Wrap an I/O error, collapsing `NotFound` into the dedicated variant so
    /// a file that vanished mid-walk reports the same way as a missing root.
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
