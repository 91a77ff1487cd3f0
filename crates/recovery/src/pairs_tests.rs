// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn fresh_pair_names_match_pattern() {
    let dir = TempDir::new().unwrap();
    let pairs = PairDir::open(dir.path()).unwrap();

    let pair = pairs.fresh_pair();
    let name = pair.name().to_string();
    assert!(name.ends_with(".0000.log"), "unexpected name: {}", name);

    let reparsed = FilePair::from_log_path(&pair.log_path).unwrap();
    assert_eq!(reparsed, pair);
    assert_eq!(reparsed.checkpoint_path, pair.checkpoint_path);
}

#[test]
fn fresh_pair_skips_existing_names() {
    let dir = TempDir::new().unwrap();
    let pairs = PairDir::open(dir.path()).unwrap();

    let first = pairs.fresh_pair();
    std::fs::write(&first.log_path, b"x").unwrap();

    // Same millisecond would collide on seq 0; the bump avoids it
    let stamp = first.name().split('.').next().unwrap().to_string();
    let second = pairs.fresh_pair();
    let second_stamp = second.name().split('.').next().unwrap();
    if second_stamp == stamp {
        assert!(second.name().ends_with(".0001.log"));
    }
}

#[test]
fn next_in_sequence_preserves_stamp() {
    let dir = TempDir::new().unwrap();
    let pairs = PairDir::open(dir.path()).unwrap();

    let mut pair = pairs.fresh_pair();
    let stamp = pair.name().split('.').next().unwrap().to_string();

    for expected in 1..=12u32 {
        pair = pair.next_in_sequence().unwrap();
        let name = pair.name().to_string();
        let mut parts = name.split('.');
        assert_eq!(parts.next().unwrap(), stamp);
        assert_eq!(parts.next().unwrap().parse::<u32>().unwrap(), expected);
        assert_eq!(parts.next().unwrap(), "log");
    }
}

#[test]
fn exhausted_sequence_starts_a_later_generation() {
    let path = Path::new("/tmp/buf").join("2020-01-01T00-00-00-000.9999.log");
    let pair = FilePair::from_log_path(&path).unwrap();

    let next = pair.next_in_sequence().unwrap();
    assert!(next.name().ends_with(".0000.log"));
    // The fresh stamp keeps name order increasing past the 4-digit limit
    assert!(next.name() > pair.name());
}

#[test]
fn malformed_names_are_hard_errors() {
    for bad in [
        "notastamp.0000.log",
        "2026-01-01T00-00-00-000.log",
        "2026-01-01T00-00-00-000.00x0.log",
        "2026-01-01T00-00-00-000.0000.txt",
        "2026-01-01T00-00-00-000.0000.log.bak",
    ] {
        let path = Path::new("/tmp").join(bad);
        assert!(
            FilePair::from_log_path(&path).is_err(),
            "accepted malformed name: {}",
            bad
        );
    }
}

#[test]
fn scan_skips_foreign_files_and_sorts() {
    let dir = TempDir::new().unwrap();
    let pairs = PairDir::open(dir.path()).unwrap();

    for name in [
        "2026-01-02T00-00-00-000.0000.log",
        "2026-01-01T00-00-00-000.0001.log",
        "2026-01-01T00-00-00-000.0000.log",
        "README.md",
        "junk.log",
        "2026-01-01T00-00-00-000.0000.checkpoint",
    ] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let found = pairs.scan().unwrap();
    let names: Vec<&str> = found.iter().map(FilePair::name).collect();
    assert_eq!(
        names,
        [
            "2026-01-01T00-00-00-000.0000.log",
            "2026-01-01T00-00-00-000.0001.log",
            "2026-01-02T00-00-00-000.0000.log",
        ]
    );
}

#[test]
fn delete_removes_both_and_tolerates_missing() {
    let dir = TempDir::new().unwrap();
    let pairs = PairDir::open(dir.path()).unwrap();

    let pair = pairs.fresh_pair();
    std::fs::write(&pair.log_path, b"data").unwrap();
    std::fs::write(&pair.checkpoint_path, 0u64.to_be_bytes()).unwrap();

    pair.delete().unwrap();
    assert!(!pair.log_path.exists());
    assert!(!pair.checkpoint_path.exists());

    // Second delete is a no-op
    pair.delete().unwrap();
}

// Property-based tests
use proptest::prelude::*;

proptest! {
    #[test]
    fn sequence_numbers_roundtrip(seq in 0u32..5000) {
        let path = Path::new("/tmp/buf")
            .join(format!("2026-08-30T10-00-00-123.{:04}.log", seq));
        let pair = FilePair::from_log_path(&path).unwrap();
        prop_assert_eq!(pair.log_path.as_path(), path.as_path());

        let next = pair.next_in_sequence().unwrap();
        let expected = format!("2026-08-30T10-00-00-123.{:04}.log", seq + 1);
        prop_assert_eq!(next.name(), expected.as_str());
    }

    #[test]
    fn ordering_is_lexicographic_on_name(a_seq in 0u32..999, b_seq in 0u32..999) {
        let make = |seq| {
            FilePair::from_log_path(
                &Path::new("/tmp/buf").join(format!("2026-08-30T10-00-00-123.{:04}.log", seq)),
            )
            .unwrap()
        };
        let (a, b) = (make(a_seq), make(b_seq));
        prop_assert_eq!(a.cmp(&b), a_seq.cmp(&b_seq));
    }
}
