// History file tests
// Atomic publication, crash leftovers, corrupt files

mod common;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use evalsect::error::Error;
use evalsect::model::{EvaluationRecord, EvaluationSnapshot};
use evalsect::repository::{encode_history, EvaluationStore, HistoryFile};
use tempfile::TempDir;

fn snapshot(ids: std::ops::Range<u32>) -> EvaluationSnapshot {
    ids.map(|n| EvaluationRecord::new(common::fake_hash(n), Some(n as u64)))
        .collect()
}

#[test]
fn test_missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let history = HistoryFile::new(dir.path().join("hydra-eval-history"));

    assert!(!history.exists());
    assert!(history.load().unwrap().is_empty());
    assert_eq!(history.modified().unwrap(), None);
}

#[test]
fn test_replace_creates_parent_and_loads_back() {
    let dir = TempDir::new().unwrap();
    let history = HistoryFile::new(dir.path().join("cache/evalsect/hydra-eval-history"));
    let expected = snapshot(0..50);

    history.replace(&expected).unwrap();

    assert!(history.exists());
    assert!(history.modified().unwrap().is_some());
    assert_eq!(history.load().unwrap(), expected);
}

#[test]
fn test_replace_discards_previous_contents() {
    let dir = TempDir::new().unwrap();
    let history = HistoryFile::new(dir.path().join("hydra-eval-history"));

    history.replace(&snapshot(0..10)).unwrap();
    history.replace(&snapshot(100..103)).unwrap();

    let loaded = history.load().unwrap();
    assert_eq!(loaded, snapshot(100..103));
    assert!(!loaded.contains(&common::fake_hash(0)));
}

#[test]
fn test_concurrent_reader_sees_whole_snapshots() {
    let dir = TempDir::new().unwrap();
    let history = HistoryFile::new(dir.path().join("hydra-eval-history"));
    let small = snapshot(0..3);
    let large = snapshot(1000..3000);
    history.replace(&small).unwrap();

    let done = AtomicBool::new(false);
    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..100 {
                let next = if i % 2 == 0 { &large } else { &small };
                history.replace(next).unwrap();
            }
            done.store(true, Ordering::Release);
        });

        let mut reads = 0;
        while !done.load(Ordering::Acquire) || reads == 0 {
            let seen = history.load().unwrap();
            assert!(
                seen == small || seen == large,
                "reader saw a partial snapshot of {} commits",
                seen.len()
            );
            reads += 1;
        }
    });
}

#[test]
fn test_stray_temporary_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydra-eval-history");
    let history = HistoryFile::new(&path);
    let previous = snapshot(0..5);
    history.replace(&previous).unwrap();

    // Writer died before renaming its half-written file into place
    let partial = encode_history(&snapshot(10..20));
    fs::write(
        dir.path().join(".hydra-eval-history.4242.tmp"),
        &partial[..partial.len() / 2],
    )
    .unwrap();

    assert_eq!(history.load().unwrap(), previous);
}

#[test]
fn test_same_snapshot_gives_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydra-eval-history");
    let history = HistoryFile::new(&path);
    let snap = snapshot(0..200);

    history.replace(&snap).unwrap();
    let first = fs::read(&path).unwrap();
    history.replace(&snap).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
    assert_eq!(first, encode_history(&snap));
}

#[test]
fn test_corrupt_file_names_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydra-eval-history");
    let good = common::fake_hash(1);
    fs::write(&path, format!("{} 1\n{} 2\nzzz 3\n", good, common::fake_hash(2))).unwrap();

    let err = HistoryFile::new(&path).load().unwrap_err();
    match err {
        Error::CorruptHistory { path: p, line, .. } => {
            assert_eq!(p, path);
            assert_eq!(line, 3);
        }
        other => panic!("expected CorruptHistory, got {:?}", other),
    }
}

#[test]
fn test_truncated_file_is_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydra-eval-history");
    let hex = common::fake_hash(1).to_hex();
    fs::write(&path, format!("{} 1\n{}", hex, &hex[..10])).unwrap();

    let err = HistoryFile::new(&path).load().unwrap_err();
    assert!(matches!(err, Error::CorruptHistory { line: 2, .. }));
    assert!(!err.is_soft());
}

#[test]
fn test_failed_scrape_style_publish_keeps_previous() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydra-eval-history");
    let history = HistoryFile::new(&path);
    history.replace(&snapshot(0..4)).unwrap();

    // Publishing into a path whose parent is a file fails
    let blocked = HistoryFile::new(path.join("nested"));
    assert!(blocked.replace(&snapshot(5..9)).is_err());

    assert_eq!(history.load().unwrap(), snapshot(0..4));
}
