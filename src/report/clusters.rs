//! Clustering of hashed entries into duplicate sets.
//!
//! Every session entry renders as a sortable dump line
//! (`HEXDIGEST:{sampling}:{path}`). Sorting the lines makes equal digests
//! contiguous, so duplicate groups fall out of a single adjacent-run scan.
//! Groups anchored on a file smaller than the size floor are dropped as
//! noise; directory groups always survive.

use std::path::{Path, PathBuf};

use bytesize::ByteSize;

use crate::hasher::{Digest, HashedEntry};
use crate::vfs::Filesystem;

/// Errors produced while resolving entry metadata for a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A member path could not be inspected (vanished or unreadable).
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One path inside a duplicate set, tagged with its size class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMember {
    /// Size-class label: zero-padded byte count, human-scaled size, and the
    /// digest's short prefix for files; a `DIR` marker for directories.
    pub label: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// Byte size for files, `0` for directories.
    pub size: u64,
}

impl SetMember {
    /// The label without the machine-sortable byte prefix, as written to the
    /// duplicate-set stream.
    #[must_use]
    pub fn display_label(&self) -> &str {
        match self.label.find('#') {
            Some(idx) => &self.label[idx + 1..],
            None => &self.label,
        }
    }
}

/// A group of paths sharing one digest.
#[derive(Debug, Clone)]
pub struct DuplicateSet {
    pub digest: Digest,
    /// `{anchor label} {full hex}`: orders sets by size class first, digest
    /// second, so the largest duplicates surface predictably.
    pub sort_key: String,
    /// Members in sorted-dump order; the first one is the retained original.
    pub members: Vec<SetMember>,
}

impl DuplicateSet {
    /// Members beyond the retained original.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Bytes freed if every non-retained file member were removed.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.members.iter().skip(1).map(|m| m.size).sum()
    }
}

/// Removal guidance for one duplicate set. Turning this into delete
/// commands or scripts is a consumer concern; the core only proposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalAction {
    pub keep: PathBuf,
    pub remove: Vec<PathBuf>,
    pub is_dir: bool,
}

/// Aggregate numbers for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Members across all surviving sets.
    pub duplicate_count: usize,
    /// Bytes held by non-retained file members.
    pub reclaimable_bytes: u64,
}

impl ReportStats {
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_bytes).to_string()
    }
}

/// The full clustering output for one session.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Every entry's dump line, lexicographically sorted.
    pub lines: Vec<String>,
    /// Surviving duplicate sets, ordered by size class then digest.
    pub sets: Vec<DuplicateSet>,
    pub stats: ReportStats,
}

impl Report {
    /// One removal action per set: keep the first member, remove the rest.
    #[must_use]
    pub fn removal_plan(&self) -> Vec<RemovalAction> {
        self.sets
            .iter()
            .filter(|set| set.members.len() >= 2)
            .map(|set| RemovalAction {
                keep: set.members[0].path.clone(),
                remove: set.members[1..].iter().map(|m| m.path.clone()).collect(),
                is_dir: set.members[0].is_dir,
            })
            .collect()
    }

    /// The duplicate-set stream: one member per line with its leading size
    /// label, a blank line between sets.
    #[must_use]
    pub fn render_sets(&self) -> String {
        let mut out = String::new();
        for set in &self.sets {
            for member in &set.members {
                out.push_str(member.display_label());
                out.push(' ');
                out.push_str(&member.path.display().to_string());
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    /// Plain-text removal plan, one `KEEP`/`REMOVE` line per path.
    #[must_use]
    pub fn render_removal_plan(&self) -> String {
        let mut out = String::new();
        for action in self.removal_plan() {
            out.push_str("KEEP   ");
            out.push_str(&action.keep.display().to_string());
            out.push('\n');
            for path in &action.remove {
                out.push_str("REMOVE ");
                out.push_str(&path.display().to_string());
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

/// Cluster a session's entries into duplicate sets.
///
/// `min_size` drops groups whose anchor is a file smaller than that many
/// bytes; directory groups are never dropped by size.
///
/// # Errors
///
/// [`ReportError::Io`] when a member path can no longer be inspected.
pub fn build_report(
    entries: &[HashedEntry],
    min_size: u64,
    fs: &dyn Filesystem,
) -> Result<Report, ReportError> {
    let mut rendered: Vec<(String, &HashedEntry)> = entries
        .iter()
        .map(|entry| (entry.render(), entry))
        .collect();
    rendered.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let lines: Vec<String> = rendered.iter().map(|(line, _)| line.clone()).collect();

    let mut sets = Vec::new();
    let mut stats = ReportStats::default();
    let mut start = 0;
    while start < rendered.len() {
        let digest = rendered[start].1.digest;
        let mut end = start + 1;
        while end < rendered.len() && rendered[end].1.digest == digest {
            end += 1;
        }
        if end - start >= 2 {
            if let Some(set) = build_set(&rendered[start..end], min_size, fs)? {
                stats.duplicate_count += set.members.len();
                stats.reclaimable_bytes += set.reclaimable();
                sets.push(set);
            }
        }
        start = end;
    }

    sets.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    log::info!(
        "{} duplicate entries in {} sets, {} reclaimable",
        stats.duplicate_count,
        sets.len(),
        stats.reclaimable_display()
    );
    Ok(Report { lines, sets, stats })
}

fn build_set(
    run: &[(String, &HashedEntry)],
    min_size: u64,
    fs: &dyn Filesystem,
) -> Result<Option<DuplicateSet>, ReportError> {
    let digest = run[0].1.digest;

    // The size filter is decided by the run's anchor alone.
    let anchor = &run[0].1.key.path;
    if !fs.is_dir(anchor) {
        let anchor_size = stat_size(fs, anchor)?;
        if anchor_size < min_size {
            log::debug!(
                "dropping duplicate group {} (anchor under {min_size} bytes)",
                digest.short_hex()
            );
            return Ok(None);
        }
    }

    // Labels are per member: a digest-space collision between a file and a
    // directory is not expected, but it must label each member by its own
    // type rather than crash or mislabel.
    let mut members = Vec::with_capacity(run.len());
    for (_, entry) in run {
        let path = entry.key.path.clone();
        let is_dir = fs.is_dir(&path);
        let (label, size) = if is_dir {
            (format!("DIR {}", digest.short_hex()), 0)
        } else {
            let size = stat_size(fs, &path)?;
            (
                format!("{:015}#{} {}", size, ByteSize(size), digest.short_hex()),
                size,
            )
        };
        members.push(SetMember {
            label,
            path,
            is_dir,
            size,
        });
    }

    let sort_key = format!("{} {}", members[0].label, digest.to_hex());
    Ok(Some(DuplicateSet {
        digest,
        sort_key,
        members,
    }))
}

fn stat_size(fs: &dyn Filesystem, path: &Path) -> Result<u64, ReportError> {
    fs.size(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
