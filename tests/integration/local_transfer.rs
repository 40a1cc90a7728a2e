//! Integration tests for transfers between two local directories

use super::test_utils::{read_tree, write_files, Recorder};
use ferry::{transfer, IgnoreFilter, LocalPlace, Route, SyncError, TransferOptions};
use std::fs;
use tempfile::TempDir;

fn options(clean: bool, force: bool) -> TransferOptions {
    TransferOptions {
        force,
        clean,
        ..TransferOptions::default()
    }
}

#[test]
fn test_full_copy_into_absent_destination() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a", "x"), ("b/c", "y")]);

    let recorder = Recorder::default();
    let diff = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(false, false),
        &recorder,
    )
    .unwrap();

    assert_eq!(diff.create, vec![Route::root(), Route::from(["b"])]);
    assert_eq!(diff.save, vec![Route::from(["a"]), Route::from(["b", "c"])]);
    assert!(diff.delete.is_empty());
    assert_eq!(read_tree(&src), read_tree(&dst));
    assert_eq!(recorder.events(), vec!["C ", "S a", "C b", "S b/c"]);
}

#[test]
fn test_equal_trees_need_no_work() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a", "x")]);
    write_files(&dst, &[("a", "x")]);

    let recorder = Recorder::default();
    let diff = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(true, false),
        &recorder,
    )
    .unwrap();

    assert!(diff.is_empty());
    assert!(recorder.events().is_empty());
}

#[test]
fn test_clean_removes_extra_entries() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).unwrap();
    write_files(&dst, &[("old", "z")]);

    let recorder = Recorder::default();
    let diff = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(true, false),
        &recorder,
    )
    .unwrap();

    assert_eq!(diff.delete, vec![Route::from(["old"])]);
    assert!(diff.create.is_empty());
    assert!(diff.save.is_empty());
    assert!(!dst.join("old").exists());
    assert!(dst.is_dir());
    assert_eq!(recorder.events(), vec!["D old"]);
}

#[test]
fn test_extra_entries_survive_without_clean() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a", "new")]);
    write_files(&dst, &[("a", "old"), ("keep/me", "k")]);

    let diff = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(false, false),
        &(),
    )
    .unwrap();

    assert_eq!(diff.save, vec![Route::from(["a"])]);
    assert!(diff.delete.is_empty());
    assert_eq!(fs::read_to_string(dst.join("a")).unwrap(), "new");
    assert_eq!(fs::read_to_string(dst.join("keep").join("me")).unwrap(), "k");
}

#[test]
fn test_ignored_names_are_invisible_on_both_sides() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("main.js", "m"), ("main.js.bak", "b"), (".git/HEAD", "h")]);
    write_files(&dst, &[(".hg/store", "s"), ("notes~", "n")]);

    let diff = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(true, false),
        &(),
    )
    .unwrap();

    assert_eq!(diff.save, vec![Route::from(["main.js"])]);
    assert!(diff.delete.is_empty(), "ignored destination entries are never deleted");
    assert!(!dst.join("main.js.bak").exists());
    assert!(!dst.join(".git").exists());
    assert!(dst.join(".hg").join("store").exists());
    assert!(dst.join("notes~").exists());
}

#[test]
fn test_custom_ignore_list_replaces_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a.tmp", "t"), ("b.bak", "b")]);

    let options = TransferOptions {
        ignore: IgnoreFilter::parse_list("*.tmp").unwrap(),
        ..TransferOptions::default()
    };
    transfer(&LocalPlace::new(&src), &LocalPlace::new(&dst), &options, &()).unwrap();

    assert!(!dst.join("a.tmp").exists());
    assert!(dst.join("b.bak").exists());
}

#[test]
fn test_mismatch_keeps_earlier_mutations() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a", "x"), ("m/inner", "i")]);
    write_files(&dst, &[("m", "file")]);

    let recorder = Recorder::default();
    let err = transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(false, false),
        &recorder,
    )
    .unwrap_err();

    assert!(matches!(err, SyncError::Mismatch { route } if route == Route::from(["m"])));
    assert_eq!(fs::read_to_string(dst.join("a")).unwrap(), "x");
    assert_eq!(fs::read_to_string(dst.join("m")).unwrap(), "file");
    assert_eq!(recorder.events(), vec!["S a"]);
}

#[test]
fn test_force_replaces_entries_of_the_other_kind() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("m/inner", "i"), ("f", "file now")]);
    write_files(&dst, &[("m", "file"), ("f/nested", "n")]);

    let recorder = Recorder::default();
    transfer(
        &LocalPlace::new(&src),
        &LocalPlace::new(&dst),
        &options(false, true),
        &recorder,
    )
    .unwrap();

    assert_eq!(read_tree(&src), read_tree(&dst));
    assert_eq!(
        recorder.events(),
        vec!["D f", "S f", "D m", "C m", "S m/inner"]
    );
}

#[test]
fn test_rerun_after_change_only_touches_changed_file() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_files(&src, &[("a", "1"), ("b/c", "2"), ("b/d", "3")]);
    let options = options(true, false);

    transfer(&LocalPlace::new(&src), &LocalPlace::new(&dst), &options, &()).unwrap();
    write_files(&src, &[("b/d", "changed")]);
    fs::remove_file(src.join("a")).unwrap();

    let recorder = Recorder::default();
    let diff = transfer(&LocalPlace::new(&src), &LocalPlace::new(&dst), &options, &recorder).unwrap();

    assert_eq!(diff.save, vec![Route::from(["b", "d"])]);
    assert_eq!(diff.delete, vec![Route::from(["a"])]);
    assert_eq!(recorder.events(), vec!["D a", "S b/d"]);
    assert_eq!(read_tree(&src), read_tree(&dst));
}
