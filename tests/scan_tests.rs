//! End-to-end scans: hash a tree, cluster the entries, check the report.

use std::fs;

use tempfile::tempdir;
use treedupe::config::EngineConfig;
use treedupe::hasher::{Sampling, TreeHasher};
use treedupe::report::build_report;
use treedupe::vfs::StdFilesystem;

fn engine() -> TreeHasher {
    TreeHasher::new(&EngineConfig::default()).unwrap()
}

#[test]
fn twin_subtrees_report_as_one_duplicate_set() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    let sub1 = root.join("sub1");
    let sub2 = root.join("sub2");
    for sub in [&sub1, &sub2] {
        fs::create_dir_all(sub.join("inner")).unwrap();
        fs::write(sub.join("a.txt"), b"identical file a").unwrap();
        fs::write(sub.join("inner").join("b.txt"), b"identical file b").unwrap();
    }
    fs::write(root.join("unique.txt"), b"only one of these").unwrap();

    let engine = engine();
    engine.hash_path(&root, Sampling::Full).unwrap();
    let report = build_report(&engine.entries(), 0, &StdFilesystem).unwrap();

    // The twin directories form exactly one directory-typed set of size 2.
    let dir_sets: Vec<_> = report
        .sets
        .iter()
        .filter(|set| set.members.iter().all(|m| m.is_dir))
        .collect();
    // sub1/sub2 and their inner/ directories each pair up.
    assert_eq!(dir_sets.len(), 2);
    let top_set = dir_sets
        .iter()
        .find(|set| set.members.iter().any(|m| m.path == sub1))
        .expect("sub1/sub2 set missing");
    assert_eq!(top_set.members.len(), 2);
    assert!(top_set.members.iter().any(|m| m.path == sub2));
    assert!(top_set.members.iter().all(|m| m.label.starts_with("DIR ")));

    // The unique file clusters with nothing.
    assert!(report
        .sets
        .iter()
        .all(|set| set.members.iter().all(|m| !m.path.ends_with("unique.txt"))));
}

#[test]
fn min_size_keeps_directory_sets() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    let sub1 = root.join("copy1");
    let sub2 = root.join("copy2");
    fs::create_dir_all(&sub1).unwrap();
    fs::create_dir_all(&sub2).unwrap();
    fs::write(sub1.join("tiny.txt"), b"small").unwrap();
    fs::write(sub2.join("tiny.txt"), b"small").unwrap();

    let engine = engine();
    engine.hash_path(&root, Sampling::Full).unwrap();
    // A floor far above every file involved.
    let report = build_report(&engine.entries(), 1024 * 1024, &StdFilesystem).unwrap();

    // The tiny file pair is filtered out, the directory pair stays.
    assert_eq!(report.sets.len(), 1);
    assert!(report.sets[0].members.iter().all(|m| m.is_dir));
}

#[test]
fn report_lines_use_the_dump_format() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("f.bin"), b"data").unwrap();

    let engine = engine();
    engine
        .hash_path(&root, Sampling::Sampled { chunk_kb: 50, chunks: 10 })
        .unwrap();
    let report = build_report(&engine.entries(), 0, &StdFilesystem).unwrap();

    assert_eq!(report.lines.len(), 2);
    for line in &report.lines {
        let (hex, rest) = line.split_at(64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert!(rest.starts_with(':'));
    }
    // The 4-byte file was demoted to a full stream; the directory keeps the
    // sampled key.
    assert!(report.lines.iter().any(|l| l.contains(":FULL:0:")));
    assert!(report.lines.iter().any(|l| l.contains(":50:10:")));
}

#[test]
fn failed_sibling_root_leaves_completed_entries_intact() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good");
    fs::create_dir(&good).unwrap();
    fs::write(good.join("a.txt"), b"payload").unwrap();
    fs::write(good.join("b.txt"), b"payload").unwrap();
    let missing = dir.path().join("missing");

    let engine = engine();
    engine.hash_path(&good, Sampling::Full).unwrap();
    assert!(engine.hash_path(&missing, Sampling::Full).is_err());

    // The good root's entries survive and still cluster.
    let report = build_report(&engine.entries(), 0, &StdFilesystem).unwrap();
    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.sets[0].members.len(), 2);
}
