//! Top-level driver wiring the CLI to the engines and the report layer.
//!
//! This is the only place that decides run-level policy: a root that fails
//! to hash is logged and skipped so the surviving roots still report, and
//! the whole run only fails when nothing could be hashed at all.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, HashArgs, HashingOpts, ScanArgs};
use crate::config::EngineConfig;
use crate::error::ExitCode;
use crate::hasher::{Sampling, TreeHasher};
use crate::report::{self, build_report};
use crate::vfs::StdFilesystem;

/// Run the parsed CLI command to completion.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Hash(args) => run_hash(args),
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_hash(args: HashArgs) -> Result<ExitCode> {
    let (engine, sampling) = build_engine(&args.hashing)?;
    let digest = engine
        .hash_path(&args.path, sampling)
        .with_context(|| format!("failed to hash {}", args.path.display()))?;
    println!("{digest}");
    Ok(ExitCode::Success)
}

fn run_scan(args: ScanArgs) -> Result<ExitCode> {
    let (engine, sampling) = build_engine(&args.hashing)?;

    if let Some(load) = &args.load {
        report::load_dump(engine.cache(), load)
            .with_context(|| format!("failed to load dump {}", load.display()))?;
    }

    let mut failed_roots = 0usize;
    for root in &args.roots {
        log::info!("hashing root {}", root.display());
        if let Err(e) = engine.hash_path(root, sampling) {
            // Completed sibling roots keep their entries; only this root is
            // dropped from the report.
            log::error!("skipping root {}: {e}", root.display());
            failed_roots += 1;
        }
    }
    if failed_roots == args.roots.len() {
        anyhow::bail!("every root failed to hash");
    }

    let entries = engine.entries();
    log::info!(
        "hashed {} entries ({} cache hits, {} computed)",
        entries.len(),
        engine.cache().hits(),
        engine.cache().misses()
    );

    let report = build_report(&entries, args.min_size, &StdFilesystem)?;

    if let Some(dump) = &args.dump {
        report::write_dump(&entries, dump)
            .with_context(|| format!("failed to write dump {}", dump.display()))?;
    }

    let sorted_path = with_suffix(&args.out, ".dat");
    let sets_path = with_suffix(&args.out, "SH.dat");
    report::write_sorted_report(&report, &sorted_path, &sets_path).with_context(|| {
        format!(
            "failed to write report files {} / {}",
            sorted_path.display(),
            sets_path.display()
        )
    })?;

    if let Some(plan) = &args.plan {
        std::fs::write(plan, report.render_removal_plan())
            .with_context(|| format!("failed to write removal plan {}", plan.display()))?;
    }

    log::info!(
        "duplicate entries found: {} holding {} of removable data",
        report.stats.duplicate_count,
        report.stats.reclaimable_display()
    );

    Ok(if report.sets.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    })
}

/// Build the engine and per-call sampling policy from CLI options layered
/// over the optional config file.
fn build_engine(opts: &HashingOpts) -> Result<(TreeHasher, Sampling)> {
    let mut config = match &opts.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(algorithm) = &opts.algorithm {
        config.algorithm = algorithm.clone();
    }
    if opts.parallel {
        config.parallel = true;
    }
    config = config.with_extra_exclusions(opts.exclude.iter().cloned());

    let sampling = if opts.full {
        Sampling::Full
    } else {
        Sampling::Sampled {
            chunk_kb: opts.chunk_kb,
            chunks: opts.chunks,
        }
    };

    let engine = TreeHasher::new(&config)?;
    Ok((engine, sampling))
}

/// Append a literal suffix to a path (`report` -> `reportSH.dat`), unlike
/// `Path::with_extension` which would replace an existing extension.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut out = base.as_os_str().to_os_string();
    out.push(suffix);
    PathBuf::from(out)
}
