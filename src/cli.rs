//! Command-line interface definitions for treedupe.
//!
//! All arguments, subcommands, and options use the clap derive API, with
//! global verbosity flags and one subcommand per operation.
//!
//! # Example
//!
//! ```bash
//! # Print one path's digest (file or directory)
//! treedupe hash ~/Downloads/big.iso
//!
//! # Scan two roots and write dupes.dat / dupesSH.dat
//! treedupe scan /mnt/a /mnt/b --out dupes
//!
//! # Only report duplicate groups of at least 100 MiB, hash in parallel
//! treedupe scan /mnt/a --min-size 100MiB --parallel
//! ```

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Duplicate file and directory-tree finder built on sampled content hashing.
#[derive(Debug, Parser)]
#[command(name = "treedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Digest a single file or directory and print the hex value
    Hash(HashArgs),
    /// Digest one or more roots and report duplicate files and trees
    Scan(ScanArgs),
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// File or directory to digest
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub hashing: HashingOpts,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Roots to scan
    #[arg(value_name = "ROOT", required = true)]
    pub roots: Vec<PathBuf>,

    /// Output base name: writes `<OUT>.dat` (sorted dump) and `<OUT>SH.dat`
    /// (duplicate sets)
    #[arg(short, long, value_name = "OUT", default_value = "dupes")]
    pub out: PathBuf,

    /// Smallest file size a duplicate group may have (e.g. 10MiB).
    /// Directory groups always count.
    #[arg(long, value_name = "SIZE", default_value = "10MiB", value_parser = parse_size)]
    pub min_size: u64,

    /// Also write the unsorted session dump to this file
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,

    /// Seed the session cache from a previous dump before hashing
    #[arg(long, value_name = "FILE")]
    pub load: Option<PathBuf>,

    /// Write a KEEP/REMOVE plan to this file
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    #[command(flatten)]
    pub hashing: HashingOpts,
}

/// Hashing options shared by every subcommand.
#[derive(Debug, Args)]
pub struct HashingOpts {
    /// Sample chunk size in KiB
    #[arg(long, value_name = "KIB", default_value = "50")]
    pub chunk_kb: u32,

    /// Number of sampled chunks (the start and end chunks are added on top)
    #[arg(long, value_name = "N", default_value = "10")]
    pub chunks: u32,

    /// Stream whole files instead of sampling
    #[arg(long)]
    pub full: bool,

    /// Digest algorithm (sha256 or blake3); defaults to the config file
    /// value, otherwise sha256
    #[arg(long, value_name = "NAME")]
    pub algorithm: Option<String>,

    /// Hash directory children on a thread pool
    #[arg(long)]
    pub parallel: bool,

    /// Additional excluded path substrings (repeatable)
    #[arg(long = "exclude", value_name = "SUBSTRING")]
    pub exclude: Vec<String>,

    /// Configuration file overriding the built-in defaults
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Parse a human-readable size string (e.g. "10MiB", "1GB", "512").
fn parse_size(input: &str) -> Result<u64, String> {
    input
        .parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("invalid size '{input}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_suffixes() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("10MiB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert!(parse_size("ten megabytes").is_err());
    }

    #[test]
    fn cli_parses_scan_with_options() {
        let cli = Cli::try_parse_from([
            "treedupe", "scan", "/a", "/b", "--out", "report", "--min-size", "1MiB",
            "--chunk-kb", "25", "--chunks", "4", "--parallel",
        ])
        .unwrap();
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.roots, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(args.out, PathBuf::from("report"));
        assert_eq!(args.min_size, 1024 * 1024);
        assert_eq!(args.hashing.chunk_kb, 25);
        assert_eq!(args.hashing.chunks, 4);
        assert!(args.hashing.parallel);
    }

    #[test]
    fn cli_parses_hash_defaults() {
        let cli = Cli::try_parse_from(["treedupe", "hash", "/data"]).unwrap();
        let Commands::Hash(args) = cli.command else {
            panic!("expected hash");
        };
        assert_eq!(args.path, PathBuf::from("/data"));
        assert_eq!(args.hashing.chunk_kb, 50);
        assert_eq!(args.hashing.chunks, 10);
        assert!(!args.hashing.full);
        assert!(args.hashing.algorithm.is_none());
    }
}
