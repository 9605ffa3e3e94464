//! Duplicate reporting.
//!
//! Turns the flat multiset of digests a session produced into:
//!
//! - the sorted dump (the stable, machine-consumable record of every digest)
//! - duplicate sets (groups of paths sharing a digest, size-filtered)
//! - a removal plan (keep the first member of each set, remove the rest)
//!
//! Everything here is derived and read-only: a report is recomputed in full
//! from the session entries each time it is requested.

pub mod clusters;
pub mod dump;

pub use clusters::{
    build_report, DuplicateSet, RemovalAction, Report, ReportError, ReportStats, SetMember,
};
pub use dump::{load_dump, write_dump, write_sorted_report};
