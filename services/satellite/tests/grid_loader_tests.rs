//! Map Loading Tests
//!
//! Loads map files from disk: row orientation, padding of short maps and
//! I/O error reporting.

use std::fs;
use std::path::PathBuf;

use satellite::grid::{FillPolicy, GridDimensions, GridError, GridLoader};

/// Writes `contents` to a file unique to the calling test.
fn map_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "satellite-{}-{name}.txt",
        std::process::id()
    ));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_file_orients_rows_bottom_up() {
    let path = map_file("orient", "top.\nmid.\nbot.\n");
    let grid = GridLoader::new(GridDimensions::new(4, 3), FillPolicy::Strict)
        .load_file(&path)
        .unwrap();

    assert_eq!(grid.row(0), b"bot.");
    assert_eq!(grid.row(2), b"top.");
    assert_eq!(grid.pixel_at(3, 1), b'.');
    fs::remove_file(path).unwrap();
}

#[test]
fn test_short_map_is_padded_when_asked() {
    let path = map_file("short-pad", "abc\nd\n");
    let grid = GridLoader::new(GridDimensions::new(3, 3), FillPolicy::Pad(b'~'))
        .load_file(&path)
        .unwrap();

    assert_eq!(grid.row(2), b"abc");
    assert_eq!(grid.row(1), b"d~~");
    assert_eq!(grid.row(0), b"~~~");
    fs::remove_file(path).unwrap();
}

#[test]
fn test_missing_file_names_path() {
    let path = std::env::temp_dir().join("satellite-no-such-map.txt");
    let err = GridLoader::new(GridDimensions::default(), FillPolicy::Strict)
        .load_file(&path)
        .unwrap_err();

    match err {
        GridError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}
