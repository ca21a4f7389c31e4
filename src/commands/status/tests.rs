use std::fs;

use super::*;

#[test]
fn latest_manifest_picks_newest_stamp() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in [
        "extract_run_20240101T000000Z.json",
        "extract_run_20240309T140507Z.json",
        "extract_run_20231231T235959Z.json",
        "notes.json",
        "extract_run_20991231T000000Z.txt",
    ] {
        fs::write(dir.path().join(name), b"{}").expect("write");
    }

    let latest = latest_manifest_path(dir.path()).expect("scan").expect("found");
    assert_eq!(
        latest.file_name().unwrap(),
        "extract_run_20240309T140507Z.json"
    );
}

#[test]
fn latest_manifest_is_none_without_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let latest = latest_manifest_path(&dir.path().join("manifests")).expect("scan");
    assert!(latest.is_none());
}
