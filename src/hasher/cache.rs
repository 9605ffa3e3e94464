//! Session digest cache.
//!
//! Memoizes `CacheKey -> Digest` for the lifetime of one hashing session so
//! a subtree reachable from several roots (or shared between parallel
//! workers) is hashed exactly once. The cache also doubles as the session's
//! entry collection: everything it holds at the end of a run is the input to
//! duplicate clustering.
//!
//! The cache is never invalidated mid-session; callers that suspect files
//! changed start a fresh session instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::hasher::{CacheKey, Digest, HashError, HashedEntry};

#[derive(Debug, Clone, Copy)]
enum Slot {
    /// A worker is computing this key; waiters block on the condvar.
    InFlight,
    Ready(Digest),
}

/// Concurrency-safe digest memoization with at-most-once computation per key.
///
/// The first caller for a key computes while concurrent callers for the same
/// key wait on a condvar for the published result; there is no busy-polling
/// and no duplicate in-flight computation. A failed computation clears its
/// in-flight marker before propagating, so the key is not poisoned and a
/// later caller may retry.
#[derive(Debug, Default)]
pub struct DigestCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    published: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DigestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, blocking while another worker has it in flight.
    /// Returns `None` when the key has never completed.
    #[must_use]
    pub fn lookup(&self, key: &CacheKey) -> Option<Digest> {
        let mut slots = self.lock();
        loop {
            match slots.get(key) {
                Some(Slot::Ready(digest)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(*digest);
                }
                Some(Slot::InFlight) => {
                    slots = self
                        .published
                        .wait(slots)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => return None,
            }
        }
    }

    /// Return the cached digest for `key`, or run `compute` to produce it.
    ///
    /// Exactly one caller computes a given key at a time; the rest block
    /// until the result is published.
    ///
    /// # Errors
    ///
    /// Propagates whatever `compute` fails with. Errors are not cached.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> Result<Digest, HashError>
    where
        F: FnOnce() -> Result<Digest, HashError>,
    {
        let mut slots = self.lock();
        loop {
            match slots.get(key) {
                Some(Slot::Ready(digest)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(*digest);
                }
                Some(Slot::InFlight) => {
                    slots = self
                        .published
                        .wait(slots)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }
        slots.insert(key.clone(), Slot::InFlight);
        drop(slots);
        self.misses.fetch_add(1, Ordering::Relaxed);

        let result = compute();
        let mut slots = self.lock();
        match &result {
            Ok(digest) => {
                slots.insert(key.clone(), Slot::Ready(*digest));
            }
            Err(_) => {
                slots.remove(key);
            }
        }
        drop(slots);
        self.published.notify_all();
        result
    }

    /// Record an externally computed digest, e.g. when reloading a dump.
    pub fn seed(&self, key: CacheKey, digest: Digest) {
        self.lock().insert(key, Slot::Ready(digest));
    }

    /// Number of completed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every completed entry, in no particular order.
    #[must_use]
    pub fn entries(&self) -> Vec<HashedEntry> {
        self.lock()
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready(digest) => Some(HashedEntry {
                    digest: *digest,
                    key: key.clone(),
                }),
                Slot::InFlight => None,
            })
            .collect()
    }

    /// Lookups answered from the cache so far.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Computations actually performed so far.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
