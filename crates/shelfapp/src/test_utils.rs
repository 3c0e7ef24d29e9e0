use crate::paths::StorageLayout;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway storage root, trash and share area under one temp dir.
pub struct TestEnv {
    // Held so the directory lives as long as the env.
    pub _temp_dir: TempDir,
    pub layout: StorageLayout,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let base = temp_dir.path();
        let layout = StorageLayout::new(base.join("storage"), base.join("trash"), base.join("shares"));
        layout.ensure().expect("failed to create layout");
        Self {
            _temp_dir: temp_dir,
            layout,
        }
    }

    /// Absolute path of a root-relative path.
    pub fn abs(&self, rel: &str) -> PathBuf {
        self.layout.root.join(rel)
    }

    /// Write a file under the storage root, creating parents.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.abs(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::write(&path, content).expect("failed to write file");
        path
    }

    pub fn mkdir(&self, rel: &str) -> PathBuf {
        let path = self.abs(rel);
        fs::create_dir_all(&path).expect("failed to create dir");
        path
    }
}
