//! Integration tests for pointview-io
//!
//! These tests write real files to the temp directory and load them back
//! through `SourceFile`.

use pointview_core::ErrorKind;
use pointview_io::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `contents` to `name` inside a fresh temp directory
///
/// The directory is removed when the returned guard is dropped.
fn write_temp(name: &str, contents: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

fn binary_pcd(points: &[[f32; 3]]) -> Vec<u8> {
    let mut bytes = format!(
        "# .PCD v0.7 - Point Cloud Data file format\n\
         VERSION 0.7\n\
         FIELDS x y z\n\
         SIZE 4 4 4\n\
         TYPE F F F\n\
         COUNT 1 1 1\n\
         WIDTH {n}\n\
         HEIGHT 1\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {n}\n\
         DATA binary\n",
        n = points.len()
    )
    .into_bytes();
    for p in points {
        for v in p {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    bytes
}

#[test]
fn test_open_xyz_file() {
    let (_dir, path) = write_temp("survey.xyz", b"# x y z\n0 0 0\n1.5 2 3\n\nnan 1 1\n");
    let file = SourceFile::open(&path).unwrap();

    assert_eq!(file.format(), PointCloudFormat::Xyz);
    assert_eq!(file.summary().name, "survey.xyz");
    assert_eq!(file.summary().byte_len, std::fs::metadata(&path).unwrap().len() as usize);

    assert_eq!(file.bytes(), std::fs::read(&path).unwrap().as_slice());

    let coords = file.decode().unwrap();
    assert_eq!(coords.len(), 9);
    assert_eq!(&coords[..6], &[0.0, 0.0, 0.0, 1.5, 2.0, 3.0]);
    assert!(coords[6].is_nan());
}

#[test]
fn test_open_binary_pcd_file() {
    let (_dir, path) = write_temp("scan.PCD", &binary_pcd(&[[1.0, 2.0, 3.0], [-1.0, 0.5, f32::NAN]]));
    let file = SourceFile::open(&path).unwrap();
    assert_eq!(file.format(), PointCloudFormat::Pcd);

    let coords = file.decode().unwrap();
    assert_eq!(&coords[..5], &[1.0, 2.0, 3.0, -1.0, 0.5]);
    assert!(coords[5].is_nan());
}

#[test]
fn test_open_ascii_pcd_file() {
    let text = "VERSION .7\nFIELDS x y z intensity\nSIZE 4 4 4 4\nTYPE F F F F\n\
                WIDTH 2\nHEIGHT 1\nPOINTS 2\nDATA ascii\n0 0 0 10\n2 4 6 20\n";
    let (_dir, path) = write_temp("room.pcd", text.as_bytes());
    let coords = SourceFile::open(&path).unwrap().decode().unwrap();
    assert_eq!(coords, vec![0.0, 0.0, 0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn test_unsupported_extension_is_rejected_without_reading() {
    // The file does not exist; the extension alone decides
    let err = SourceFile::open("/nonexistent/roads.geojson").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn test_missing_file_is_decode_failure() {
    let err = SourceFile::open("/nonexistent/scan.pcd").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[test]
fn test_extensionless_pcd_is_sniffed() {
    let (_dir, path) = write_temp("capture", &binary_pcd(&[[0.0, 0.0, 0.0]]));
    let file = SourceFile::open(&path).unwrap();
    assert_eq!(file.format(), PointCloudFormat::Pcd);
    assert_eq!(file.decode().unwrap(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_corrupt_pcd_is_decode_failure() {
    let mut bytes = binary_pcd(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    bytes.truncate(bytes.len() - 5);
    let (_dir, path) = write_temp("broken.pcd", &bytes);

    let err = SourceFile::open(&path).unwrap().decode().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[test]
fn test_temp_files_are_cleaned_up() {
    let (dir, path) = write_temp("cleanup.xyz", b"1 2 3\n");
    assert!(SourceFile::open(&path).is_ok());
    drop(dir);
    assert!(!path.exists());
}

#[test]
fn test_size_label() {
    let file = SourceFile::from_bytes("a.xyz", vec![b' '; 1536]).unwrap();
    assert_eq!(file.summary().size_label(), "1.50 KB");
}
