//! Single-file digestion: full streams and sparse chunk sampling.
//!
//! A sampled request reads `chunks + 2` fixed-size windows spread evenly
//! across the file (one pinned to the start, one landing at the end) and
//! folds them into the digest in read order. Two situations demote a sampled
//! request to a plain full stream before any byte is read:
//!
//! 1. the sample would cover more than the configured percentage of the
//!    file, so sampling buys no speed, and
//! 2. the windows do not fit in the file at all, which would make the
//!    inter-window gap negative.
//!
//! The demotion happens before the cache key is formed, so a sampled request
//! on a small file shares its cache entry with an explicit full-hash request.

use std::io;
use std::path::Path;

use crate::hasher::{Digest, Digester, HashAlgorithm, HashError, Sampling};
use crate::vfs::{FileReader, Filesystem};

/// Concrete read schedule for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadPlan {
    /// Stream the whole file in `buffer_bytes` windows until EOF.
    Full { buffer_bytes: usize },
    /// Read `windows` windows of `chunk_bytes`, skipping `gap` bytes after
    /// each window.
    Sparse {
        chunk_bytes: usize,
        windows: u64,
        gap: u64,
    },
}

/// Decide how a file of `size` bytes is actually read for `requested`,
/// returning the effective sampling policy (the cache-key identity) and the
/// matching read schedule.
pub(crate) fn resolve(
    requested: Sampling,
    size: u64,
    threshold_pct: u64,
    default_buffer_kib: u32,
) -> (Sampling, ReadPlan) {
    let default_buffer = (u64::from(default_buffer_kib).max(1) * 1024) as usize;
    let (chunk_kb, chunks) = match requested {
        Sampling::Full => {
            return (
                Sampling::Full,
                ReadPlan::Full {
                    buffer_bytes: default_buffer,
                },
            )
        }
        Sampling::Sampled { chunk_kb, chunks } => (chunk_kb, chunks),
    };

    if chunk_kb == 0 {
        // Degenerate zero-byte windows would digest nothing at all.
        return (
            Sampling::Full,
            ReadPlan::Full {
                buffer_bytes: default_buffer,
            },
        );
    }

    let chunk_bytes = u64::from(chunk_kb) * 1024;
    // A demoted request keeps the requested chunk size as its stream buffer.
    let full = (
        Sampling::Full,
        ReadPlan::Full {
            buffer_bytes: chunk_bytes as usize,
        },
    );

    // Integer percentage math, floor first: (size / 100) * pct.
    let sample_bytes = u64::from(chunks).saturating_mul(chunk_bytes);
    if (size / 100) * threshold_pct < sample_bytes {
        return full;
    }

    let windows = u64::from(chunks) + 2;
    let occupied = windows.saturating_mul(chunk_bytes);
    if size < occupied {
        // The gap between windows would be negative; stream instead.
        return full;
    }
    let gap = (size - occupied) / (windows - 1);

    (
        requested,
        ReadPlan::Sparse {
            chunk_bytes: chunk_bytes as usize,
            windows,
            gap,
        },
    )
}

/// Digest one file according to an already-resolved [`ReadPlan`].
///
/// Buffers are folded into the digest in the exact order they are read,
/// start to end, and a short window contributes only its actually-read
/// bytes.
pub(crate) fn digest_file(
    fs: &dyn Filesystem,
    path: &Path,
    plan: ReadPlan,
    algorithm: HashAlgorithm,
) -> Result<Digest, HashError> {
    let mut reader = fs.open(path).map_err(|e| HashError::io(path, e))?;
    let mut digester = Digester::new(algorithm);

    match plan {
        ReadPlan::Full { buffer_bytes } => {
            let mut buf = vec![0u8; buffer_bytes.max(1)];
            loop {
                let n = reader
                    .read_into(&mut buf)
                    .map_err(|e| HashError::io(path, e))?;
                if n == 0 {
                    break;
                }
                digester.update(&buf[..n]);
            }
        }
        ReadPlan::Sparse {
            chunk_bytes,
            windows,
            gap,
        } => {
            let mut buf = vec![0u8; chunk_bytes];
            for _ in 0..windows {
                let n = read_window(reader.as_mut(), &mut buf).map_err(|e| HashError::io(path, e))?;
                if n == 0 {
                    break;
                }
                digester.update(&buf[..n]);
                if n < chunk_bytes {
                    // Short window: end of file reached.
                    break;
                }
                reader.advance(gap).map_err(|e| HashError::io(path, e))?;
            }
        }
    }

    Ok(digester.finalize())
}

/// Fill `buf` from the reader, stopping early only at end of file. Returns
/// the number of bytes actually read.
fn read_window(reader: &mut dyn FileReader, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read_into(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
