use super::Mapping;
use super::backend::RecordBackend;
use crate::error::{Result, ShelfError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Record backend storing the mapping as a single JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn ensure_dir(&self) -> Result<()> {
        let dir = self.dir();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(ShelfError::Io)?;
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let stem = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        self.dir().join(format!(".{}-{}.tmp", stem, Uuid::new_v4()))
    }
}

impl<R> RecordBackend<R> for JsonFileBackend
where
    R: Serialize + DeserializeOwned,
{
    fn load(&self) -> Mapping<R> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Mapping::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read record store, starting empty"
                );
                return Mapping::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corrupt record store, starting empty"
                );
                Mapping::new()
            }
        }
    }

    fn save(&self, records: &Mapping<R>) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(records).map_err(ShelfError::Serialization)?;

        // Atomic write: tmp file, fsync, rename over the target
        let tmp_path = self.tmp_path();
        let written = write_synced(&tmp_path, content.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(ShelfError::Io(e));
        }

        sync_dir(self.dir());
        tracing::debug!(path = %self.path.display(), records = records.len(), "Saved record store");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

/// Persist the rename itself. Best effort, and a no-op where directories
/// cannot be opened.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %e, "Could not sync store directory");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
