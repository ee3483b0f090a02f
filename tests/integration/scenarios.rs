//! End-to-end reconcile scenarios

use super::test_utils::{assert_congruent, assert_same_metadata, Fixture};
use std::fs;
use std::time::{Duration, SystemTime};
use treesync::error::SyncError;
use treesync::sync::{
    CancellationToken, CycleDriver, DriverConfig, MemorySink, ReconcileOptions, Reconciler,
    SyncEvent,
};

fn reconcile(fixture: &Fixture, sink: &MemorySink) -> Result<treesync::types::SyncCycleResult, SyncError> {
    Reconciler::new(ReconcileOptions::default(), sink).reconcile(&fixture.source, &fixture.target)
}

#[test]
fn test_new_file_copied_with_metadata() {
    let fixture = Fixture::new();
    let source_file = fixture.write_source("a.txt", "hello");
    let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    fs::File::options()
        .write(true)
        .open(&source_file)
        .unwrap()
        .set_modified(past)
        .unwrap();

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    let target_file = fixture.target.join("a.txt");
    assert_eq!(fs::read_to_string(&target_file).unwrap(), "hello");
    assert_eq!(fs::metadata(&target_file).unwrap().modified().unwrap(), past);
    assert_eq!(result.stats.created, 1);
    assert_congruent(&fixture.source, &fixture.target);
    assert_same_metadata(&source_file, &target_file);
    assert!(sink.events().contains(&SyncEvent::FileCreated {
        source: source_file,
        target: target_file,
    }));
}

#[test]
fn test_identical_file_is_silent() {
    let fixture = Fixture::new();
    fixture.write_source("a.txt", "same");
    fixture.write_target("a.txt", "same");

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    assert_eq!(result.stats.actions(), 0);
    assert_eq!(result.stats.unchanged, 1);
    assert!(sink.events().is_empty(), "unexpected events: {:?}", sink.events());
}

#[test]
fn test_stale_file_removed() {
    let fixture = Fixture::new();
    fs::create_dir_all(&fixture.target).unwrap();
    let stale = fixture.write_target("stale.txt", "old");

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    assert!(!stale.exists());
    assert_eq!(result.stats.removed_files, 1);
    assert_eq!(sink.events(), vec![SyncEvent::FileRemoved { path: stale }]);
}

#[test]
fn test_stale_directory_removed_recursively() {
    let fixture = Fixture::new();
    fixture.write_target("old_dir/a.txt", "a");
    fixture.write_target("old_dir/nested/b.txt", "b");
    fixture.write_source("keep.txt", "k");

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    assert!(!fixture.target.join("old_dir").exists());
    assert_eq!(result.stats.removed_dirs, 2);
    assert_eq!(result.stats.removed_files, 2);
    assert_congruent(&fixture.source, &fixture.target);
}

#[test]
fn test_missing_source_does_not_touch_target() {
    let fixture = Fixture::new();
    fixture.write_target("precious.txt", "p");
    fs::remove_dir(&fixture.source).unwrap();

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink);

    assert!(matches!(result, Err(SyncError::SourceMissing(_))));
    assert_eq!(fs::read_to_string(fixture.target.join("precious.txt")).unwrap(), "p");
    assert_eq!(sink.count_kind("source_missing"), 1);

    // The periodic driver keeps going instead of terminating
    let config = DriverConfig {
        source: fixture.source.clone(),
        target: fixture.target.clone(),
        interval: Some(Duration::ZERO),
        max_cycles: Some(2),
        options: ReconcileOptions::default(),
    };
    let summary = CycleDriver::new(config, &sink)
        .run(&CancellationToken::new())
        .unwrap();
    assert_eq!(summary.cycles, 2);
    assert_eq!(summary.skipped, 2);
    assert!(fixture.target.join("precious.txt").exists());
}

#[test]
fn test_mtime_only_difference_is_unchanged() {
    let fixture = Fixture::new();
    fixture.write_source("a.txt", "content");
    let target_file = fixture.write_target("a.txt", "content");
    let skewed = SystemTime::now() - Duration::from_secs(7 * 86_400);
    fs::File::options()
        .write(true)
        .open(&target_file)
        .unwrap()
        .set_modified(skewed)
        .unwrap();

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    assert_eq!(result.stats.actions(), 0);
    assert_eq!(fs::metadata(&target_file).unwrap().modified().unwrap(), skewed);
}

#[test]
fn test_changed_content_updates() {
    let fixture = Fixture::new();
    let source_file = fixture.write_source("dir/a.txt", "new");
    let target_file = fixture.write_target("dir/a.txt", "old and longer");

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink).unwrap();

    assert_eq!(result.stats.updated, 1);
    assert_eq!(fs::read_to_string(&target_file).unwrap(), "new");
    assert_eq!(
        sink.events(),
        vec![SyncEvent::FileUpdated {
            source: source_file,
            target: target_file,
        }]
    );
}

#[test]
fn test_secondary_digest_mode_converges() {
    let fixture = Fixture::new();
    fixture.write_source("a.txt", "alpha");
    fixture.write_source("b/c.txt", "gamma");
    fixture.write_target("a.txt", "stale");

    let sink = MemorySink::new();
    let options = ReconcileOptions {
        use_secondary: true,
        ..Default::default()
    };
    let result = Reconciler::new(options, &sink)
        .reconcile(&fixture.source, &fixture.target)
        .unwrap();

    assert_eq!(result.stats.updated, 1);
    assert_eq!(result.stats.created, 1);
    assert_congruent(&fixture.source, &fixture.target);
}

#[test]
fn test_empty_source_directories_not_mirrored() {
    // Only regular files are mirrored; their parents are created on demand
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.source.join("empty")).unwrap();
    fixture.write_source("full/a.txt", "a");

    let sink = MemorySink::new();
    reconcile(&fixture, &sink).unwrap();

    assert!(fixture.target.join("full").join("a.txt").exists());
    assert!(!fixture.target.join("empty").exists());

    // An existing empty target directory with a source counterpart is kept
    fs::create_dir_all(fixture.target.join("empty")).unwrap();
    reconcile(&fixture, &sink).unwrap();
    assert!(fixture.target.join("empty").is_dir());
}

#[test]
fn test_type_mismatch_aborts_copy_and_is_reported() {
    let fixture = Fixture::new();
    fixture.write_source("thing", "file in source");
    fixture.write_target("thing/inner.txt", "dir in target");

    let sink = MemorySink::new();
    let result = reconcile(&fixture, &sink);

    // Comparing a file against a directory fails in the reconciler
    assert!(matches!(result, Err(SyncError::Io { .. })));
    assert!(fixture.target.join("thing").join("inner.txt").exists());
}
