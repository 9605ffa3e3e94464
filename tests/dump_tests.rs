//! Dump, reload, and report-file round trips.

mod common;

use std::fs;

use tempfile::tempdir;
use treedupe::config::EngineConfig;
use treedupe::hasher::{DigestCache, Sampling, TreeHasher};
use treedupe::report::{build_report, load_dump, write_dump, write_sorted_report};
use treedupe::vfs::StdFilesystem;

use common::CountingFilesystem;

#[test]
fn dump_round_trips_through_load() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.bin"), b"alpha").unwrap();
    fs::write(root.join("b.bin"), b"beta").unwrap();

    let engine = TreeHasher::new(&EngineConfig::default()).unwrap();
    engine.hash_path(&root, Sampling::Full).unwrap();
    let entries = engine.entries();

    let dump_path = dir.path().join("session.dump");
    write_dump(&entries, &dump_path).unwrap();

    let cache = DigestCache::new();
    let loaded = load_dump(&cache, &dump_path).unwrap();
    assert_eq!(loaded, entries.len());

    let mut reloaded = cache.entries();
    let mut original = entries.clone();
    reloaded.sort_by(|a, b| a.key.cmp(&b.key));
    original.sort_by(|a, b| a.key.cmp(&b.key));
    assert_eq!(reloaded, original);
}

#[test]
fn seeded_session_recomputes_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.bin"), b"alpha").unwrap();
    fs::write(root.join("b.bin"), b"beta").unwrap();

    let first = TreeHasher::new(&EngineConfig::default()).unwrap();
    first.hash_path(&root, Sampling::Full).unwrap();
    let dump_path = dir.path().join("session.dump");
    write_dump(&first.entries(), &dump_path).unwrap();

    let fs_counter = CountingFilesystem::new();
    let second =
        TreeHasher::with_filesystem(&EngineConfig::default(), fs_counter.clone()).unwrap();
    load_dump(second.cache(), &dump_path).unwrap();

    let digest = second.hash_path(&root, Sampling::Full).unwrap();
    assert_eq!(digest, first.hash_path(&root, Sampling::Full).unwrap());
    // Every node was answered from the seeded cache.
    assert_eq!(fs_counter.opens(), 0);
    assert_eq!(second.cache().misses(), 0);
}

#[test]
fn malformed_dump_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let dump_path = dir.path().join("mixed.dump");
    let good = format!("{}:FULL:0:/some/file", "AB".repeat(32));
    fs::write(&dump_path, format!("{good}\nnot a dump line\n\n")).unwrap();

    let cache = DigestCache::new();
    assert_eq!(load_dump(&cache, &dump_path).unwrap(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn sorted_report_files_match_the_report() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("one.bin"), b"payload!").unwrap();
    fs::write(root.join("two.bin"), b"payload!").unwrap();

    let engine = TreeHasher::new(&EngineConfig::default()).unwrap();
    engine.hash_path(&root, Sampling::Full).unwrap();
    let report = build_report(&engine.entries(), 0, &StdFilesystem).unwrap();

    let sorted_path = dir.path().join("out.dat");
    let sets_path = dir.path().join("outSH.dat");
    write_sorted_report(&report, &sorted_path, &sets_path).unwrap();

    let sorted = fs::read_to_string(&sorted_path).unwrap();
    let written_lines: Vec<&str> = sorted.lines().collect();
    assert_eq!(written_lines.len(), report.lines.len());
    let mut resorted = written_lines.clone();
    resorted.sort_unstable();
    assert_eq!(written_lines, resorted);

    let sets = fs::read_to_string(&sets_path).unwrap();
    assert_eq!(sets, report.render_sets());
    // Both duplicate paths appear, each prefixed by a human size label.
    assert!(sets.contains("one.bin"));
    assert!(sets.contains("two.bin"));
}
