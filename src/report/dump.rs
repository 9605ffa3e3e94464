//! Text dump and reload of a hashing session.
//!
//! Dump lines are `HEXDIGEST:{chunk_kb}:{chunks}:{path}` (full-hash entries
//! carry `FULL:0` as their two middle fields). The format is stable: it is
//! both the sorted report consumed by external tooling and the seed format
//! for warm-starting a later session.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::hasher::{CacheKey, Digest, DigestCache, HashedEntry, Sampling, DIGEST_LEN};
use crate::report::Report;

/// Write every session entry as one dump line, unsorted.
pub fn write_dump(entries: &[HashedEntry], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for entry in entries {
        writeln!(writer, "{}", entry.render())?;
    }
    writer.flush()
}

/// Write the sorted dump and the duplicate-set stream of a built report.
pub fn write_sorted_report(report: &Report, dump_path: &Path, sets_path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(dump_path)?);
    for line in &report.lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(sets_path)?);
    writer.write_all(report.render_sets().as_bytes())?;
    writer.flush()
}

/// Seed a cache from a dump written by [`write_dump`] (or the sorted dump;
/// the line format is identical). Returns the number of entries loaded.
///
/// Malformed lines are skipped with a warning rather than failing the whole
/// load; a partially stale dump is still a useful warm start.
pub fn load_dump(cache: &DigestCache, path: &Path) -> io::Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut loaded = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(entry) => {
                cache.seed(entry.key, entry.digest);
                loaded += 1;
            }
            None => log::warn!("skipping malformed dump line: {line}"),
        }
    }
    log::info!("loaded {loaded} cached digests from {}", path.display());
    Ok(loaded)
}

/// Parse one dump line back into an entry.
///
/// The path is everything after the second key separator, so paths that
/// themselves contain `:` (Windows drive prefixes) survive the round trip.
fn parse_line(line: &str) -> Option<HashedEntry> {
    let (hex, rest) = line.split_at_checked(DIGEST_LEN * 2)?;
    let digest = Digest::from_hex(hex)?;
    let rest = rest.strip_prefix(':')?;
    let (first, rest) = rest.split_once(':')?;
    let (second, path) = rest.split_once(':')?;
    let sampling = Sampling::parse_fields(first, second)?;
    if path.is_empty() {
        return None;
    }
    Some(HashedEntry {
        digest,
        key: CacheKey::new(sampling, PathBuf::from(path)),
    })
}
