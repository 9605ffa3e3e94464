//! Hierarchical digestion.
//!
//! [`TreeHasher`] digests a path of either kind: files go through the
//! sampled engine, directories recurse over their eligible children and fold
//! the child digests into one value. The fold sorts the child digests
//! bytewise before hashing their concatenation, which makes a directory's
//! digest independent of the order the filesystem enumerates its children:
//! equal child sets always contribute identical byte streams.
//!
//! Every node consults the shared [`DigestCache`] first, so subtrees
//! reachable from several roots are digested once per session.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::{EngineConfig, ExclusionRules};
use crate::hasher::cache::DigestCache;
use crate::hasher::sampled;
use crate::hasher::{CacheKey, Digest, Digester, HashAlgorithm, HashError, HashedEntry, Sampling};
use crate::vfs::{Filesystem, StdFilesystem};

/// Recursive digest engine over files and directory trees.
pub struct TreeHasher {
    algorithm: HashAlgorithm,
    fs: Arc<dyn Filesystem>,
    cache: DigestCache,
    exclusions: ExclusionRules,
    threshold_pct: u64,
    buffer_kib: u32,
    parallel: bool,
}

impl fmt::Debug for TreeHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeHasher")
            .field("algorithm", &self.algorithm)
            .field("cache", &self.cache)
            .field("exclusions", &self.exclusions)
            .field("threshold_pct", &self.threshold_pct)
            .field("buffer_kib", &self.buffer_kib)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

impl TreeHasher {
    /// Build an engine over the real filesystem.
    ///
    /// # Errors
    ///
    /// [`HashError::UnsupportedAlgorithm`] when the configured algorithm
    /// name is unknown.
    pub fn new(config: &EngineConfig) -> Result<Self, HashError> {
        Self::with_filesystem(config, Arc::new(StdFilesystem))
    }

    /// Build an engine over an injected filesystem (tests use counting or
    /// reordering wrappers here).
    pub fn with_filesystem(
        config: &EngineConfig,
        fs: Arc<dyn Filesystem>,
    ) -> Result<Self, HashError> {
        Ok(Self {
            algorithm: HashAlgorithm::from_name(&config.algorithm)?,
            fs,
            cache: DigestCache::new(),
            exclusions: ExclusionRules::from(config),
            threshold_pct: config.full_hash_threshold_pct,
            buffer_kib: config.buffer_kib,
            parallel: config.parallel,
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn cache(&self) -> &DigestCache {
        &self.cache
    }

    /// Snapshot of every digest computed (or seeded) this session.
    #[must_use]
    pub fn entries(&self) -> Vec<HashedEntry> {
        self.cache.entries()
    }

    /// Digest a file or directory using the raw integer contract
    /// (`chunk_count == -1` selects full hashing).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for out-of-range parameters, plus everything
    /// [`TreeHasher::hash_path`] can fail with.
    pub fn hash_path_raw(
        &self,
        path: &Path,
        chunk_size_kb: i64,
        chunk_count: i64,
    ) -> Result<Digest, HashError> {
        self.hash_path(path, Sampling::from_raw(chunk_size_kb, chunk_count)?)
    }

    /// Digest a file or directory.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] when the path does not exist
    /// - [`HashError::InvalidArgument`] when it is neither a regular file
    ///   nor a directory
    /// - [`HashError::Io`] on read or enumeration failures anywhere in the
    ///   subtree; a child failure aborts the whole directory digest
    pub fn hash_path(&self, path: &Path, sampling: Sampling) -> Result<Digest, HashError> {
        if !self.fs.exists(path) {
            return Err(HashError::NotFound(path.to_path_buf()));
        }
        let canonical = self
            .fs
            .canonicalize(path)
            .map_err(|e| HashError::io(path, e))?;
        let is_file = self.fs.is_file(&canonical);
        let is_dir = self.fs.is_dir(&canonical);
        if !is_file && !is_dir {
            return Err(HashError::InvalidArgument(format!(
                "{} is neither a regular file nor a directory",
                canonical.display()
            )));
        }

        log::debug!("hashing {}", canonical.display());
        if is_file {
            self.hash_file_node(canonical, sampling)
        } else {
            self.hash_dir_node(canonical, sampling)
        }
    }

    fn hash_file_node(&self, canonical: PathBuf, requested: Sampling) -> Result<Digest, HashError> {
        let size = self
            .fs
            .size(&canonical)
            .map_err(|e| HashError::io(&canonical, e))?;
        let (effective, plan) =
            sampled::resolve(requested, size, self.threshold_pct, self.buffer_kib);
        if effective != requested {
            log::trace!(
                "sampling would cover most of {} ({size} bytes), streaming it whole",
                canonical.display()
            );
        }
        let key = CacheKey::new(effective, canonical);
        self.cache.get_or_compute(&key, || {
            sampled::digest_file(self.fs.as_ref(), &key.path, plan, self.algorithm)
        })
    }

    fn hash_dir_node(&self, canonical: PathBuf, sampling: Sampling) -> Result<Digest, HashError> {
        let key = CacheKey::new(sampling, canonical);
        if let Some(digest) = self.cache.lookup(&key) {
            return Ok(digest);
        }

        let children = self.eligible_children(&key.path)?;
        if children.is_empty() {
            // An empty directory is a valid, stable entity with a fixed
            // digest. It is not recorded as a session entry.
            log::trace!("{} has no eligible children", key.path.display());
            return Ok(Digest::EMPTY_TREE);
        }

        self.cache.get_or_compute(&key, || {
            let digests = self.hash_children(&children, sampling)?;
            Ok(self.fold(digests))
        })
    }

    /// Immediate children that participate in hashing: regular files and
    /// directories, minus anything the exclusion rules match. Exclusions are
    /// applied here, before any hashing work is scheduled.
    fn eligible_children(&self, dir: &Path) -> Result<Vec<PathBuf>, HashError> {
        let mut children = Vec::new();
        for child in self
            .fs
            .list_children(dir)
            .map_err(|e| HashError::io(dir, e))?
        {
            if !self.fs.is_file(&child) && !self.fs.is_dir(&child) {
                log::trace!("skipping special file {}", child.display());
                continue;
            }
            let canonical = self
                .fs
                .canonicalize(&child)
                .map_err(|e| HashError::io(&child, e))?;
            if self.exclusions.is_excluded(&canonical) {
                log::debug!("excluded {}", canonical.display());
                continue;
            }
            children.push(child);
        }
        Ok(children)
    }

    fn hash_children(
        &self,
        children: &[PathBuf],
        sampling: Sampling,
    ) -> Result<Vec<Digest>, HashError> {
        if self.parallel {
            // collect() is the join: every child completes (or the first
            // error short-circuits) before the fold may run.
            children
                .par_iter()
                .map(|child| self.hash_path(child, sampling))
                .collect()
        } else {
            children
                .iter()
                .map(|child| self.hash_path(child, sampling))
                .collect()
        }
    }

    /// Fold child digests into the directory digest: sort bytewise, then
    /// hash the sorted digests' raw bytes in order.
    fn fold(&self, mut digests: Vec<Digest>) -> Digest {
        // Unstable sort is safe: bytewise-equal digests contribute identical
        // bytes wherever the sort puts them.
        digests.sort_unstable();
        let mut digester = Digester::new(self.algorithm);
        for digest in &digests {
            digester.update(digest.as_bytes());
        }
        digester.finalize()
    }
}
