//! Shared test utilities for deploykit tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with temporary directories for fixture sources and
/// fetch destinations.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Fixture directory (source side of fetches)
    pub fixtures: PathBuf,
    /// Media root (destination side of fetches)
    pub media_root: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let fixtures = base.join("fixtures");
        let media_root = base.join("media");
        fs::create_dir_all(&fixtures).expect("Failed to create fixtures dir");
        fs::create_dir_all(&media_root).expect("Failed to create media dir");

        Self {
            _temp_dir: temp_dir,
            fixtures,
            media_root,
        }
    }

    /// Write a fixture file and return its path.
    pub fn write_fixture(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.fixtures.join(name);
        fs::write(&path, content).expect("Failed to write fixture");
        path
    }
}

/// Assert a file exists and holds exactly `content`.
pub fn assert_file_content(path: &Path, content: &[u8]) {
    assert!(path.exists(), "expected file {} to exist", path.display());
    let actual = fs::read(path).expect("Failed to read file");
    assert_eq!(actual, content, "content mismatch for {}", path.display());
}

/// Assert no leftover temp file exists next to `dest`.
pub fn assert_no_temp(dest: &Path) {
    let tmp = deploykit::download::temp_path(dest);
    assert!(
        !tmp.exists(),
        "leftover temp file {} should have been removed",
        tmp.display()
    );
}
