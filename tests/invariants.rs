//! Contract Invariant Tests
//!
//! These tests verify the guarantees the consumer server relies on.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tileflags_core::{
    decode, export, load, verify, DecodeError, EmptyPolicy, ExportConfig, ExportError, Exporter,
};

fn target_in(dir: &TempDir) -> PathBuf {
    dir.path().join("data/tile/flags.dat")
}

#[test]
fn invariant_concrete_scenario() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);

    export(&[true, false, true], &[false, false, true], &target).unwrap();

    let bytes = fs::read(&target).unwrap();
    assert_eq!(bytes.len(), 14);

    let snapshot = decode(&bytes).unwrap();
    assert_eq!(snapshot.tile_count(), 3);
    assert_eq!(snapshot.frame_important(), &[true, false, true]);
    assert_eq!(snapshot.solid(), &[false, false, true]);
}

#[test]
fn invariant_empty_export_is_header_only() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);

    export(&[], &[], &target).unwrap();

    let bytes = fs::read(&target).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
    assert_eq!(load(&target).unwrap().tile_count(), 0);
}

#[test]
fn invariant_mismatched_lengths_write_nothing() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);

    let err = export(&[true, false], &[true], &target).unwrap_err();
    assert!(matches!(err, ExportError::SchemaViolation(_)));
    assert!(!target.exists());
}

#[test]
fn invariant_rejected_export_keeps_prior_file() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);

    export(&[true], &[false], &target).unwrap();
    let before = fs::read(&target).unwrap();

    assert!(export(&[true, true], &[false], &target).is_err());
    assert_eq!(fs::read(&target).unwrap(), before);
}

#[test]
fn invariant_export_replaces_whole_file() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);

    export(&[true; 10], &[false; 10], &target).unwrap();
    export(&[false, true], &[true, true], &target).unwrap();

    let bytes = fs::read(&target).unwrap();
    assert_eq!(bytes.len(), 12);
    let snapshot = decode(&bytes).unwrap();
    assert_eq!(snapshot.frame_important(), &[false, true]);
}

#[test]
fn invariant_identical_input_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let exporter = Exporter::default();
    let fi = [true, false, false, true];
    let solid = [true, true, false, false];

    let a = exporter.export_to(&fi, &solid, &dir.path().join("a.dat")).unwrap();
    let b = exporter.export_to(&fi, &solid, &dir.path().join("b.dat")).unwrap();

    assert_eq!(a.sha256, b.sha256);
    assert_eq!(a.content_hash, b.content_hash);
    assert_ne!(a.export_id, b.export_id);
}

#[test]
fn invariant_truncated_file_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);
    export(&[true, false, true], &[false, false, true], &target).unwrap();

    let bytes = fs::read(&target).unwrap();
    for len in 0..bytes.len() {
        assert!(matches!(decode(&bytes[..len]), Err(DecodeError::TruncatedInput { .. })));
    }
}

#[test]
fn invariant_trailing_bytes_fail_to_load() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);
    export(&[true], &[true], &target).unwrap();

    let mut bytes = fs::read(&target).unwrap();
    bytes.push(0);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::TrailingData { expected: 10, found: 11 }
    );
}

#[test]
fn invariant_configured_target_and_manifest() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig {
        output_root: dir.path().to_path_buf(),
        ..ExportConfig::default()
    };
    let exporter = Exporter::new(config);

    let manifest = exporter.export(&[false, true], &[true, true]).unwrap();

    let target = target_in(&dir);
    assert!(target.exists());
    assert!(dir.path().join("data/tile/flags.dat.manifest.json").exists());
    assert_eq!(verify(&target).unwrap(), manifest);
}

#[test]
fn invariant_block_policy_rejects_empty_tables() {
    let dir = TempDir::new().unwrap();
    let config = ExportConfig {
        output_root: dir.path().to_path_buf(),
        empty_policy: EmptyPolicy::Block,
        ..ExportConfig::default()
    };

    let err = Exporter::new(config).export(&[], &[]).unwrap_err();
    assert!(err.to_string().contains("Schema violation"));
    assert!(!target_in(&dir).exists());
}

#[test]
fn invariant_failed_manifest_write_keeps_prior_file() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);
    let exporter = Exporter::default();

    exporter.export_to(&[true], &[true], &target).unwrap();
    let before = fs::read(&target).unwrap();

    // A non-empty directory where the manifest belongs cannot be replaced
    let manifest_path = dir.path().join("data/tile/flags.dat.manifest.json");
    fs::remove_file(&manifest_path).unwrap();
    fs::create_dir_all(manifest_path.join("x")).unwrap();

    let err = exporter.export_to(&[false, false], &[false, false], &target).unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
    assert_eq!(fs::read(&target).unwrap(), before);

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("data/tile"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 2);
}

#[test]
fn invariant_failed_manifest_write_leaves_no_new_file() {
    let dir = TempDir::new().unwrap();
    let target = target_in(&dir);
    fs::create_dir_all(dir.path().join("data/tile/flags.dat.manifest.json/x")).unwrap();

    let err = Exporter::default().export_to(&[true], &[false], &target).unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
    assert!(!target.exists());
}

#[test]
fn invariant_unwritable_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/tile"), b"not a directory").unwrap();

    let target = target_in(&dir);
    let err = export(&[true, false], &[false, true], &target).unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
    assert!(!target.exists());
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_export_calls_validate() {
    use tileflags_core::exporter::{get_validation_call_count, reset_validation_call_count};

    let dir = TempDir::new().unwrap();
    reset_validation_call_count();
    export(&[true], &[false], &target_in(&dir)).unwrap();
    assert!(get_validation_call_count() >= 1);
}
