//! # Configuration
//!
//! Shelf reads one JSON file, `config.json`, from its config directory.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `STORAGE_PATH`, `TRASH_PATH`, `SHARE_PATH`,
//!    `SHELF_ARCHIVE_WORKERS`.
//! 2. **Config file**: `<config_dir>/config.json`. Missing keys fall back to
//!    the defaults below.
//! 3. **Defaults**: `storage/`, `trash/` and `shares/` under the platform
//!    data directory (via the `directories` crate), and
//!    [`ArchiveSettings::default`].
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `storage_path` | `<data>/storage` | Root every caller path is relative to |
//! | `trash_path` | `<data>/trash` | Holding area for soft-deleted items |
//! | `share_path` | `<data>/shares` | Share metadata directory |
//! | `archive.workers` | `2` | Archive worker threads |
//! | `archive.progress_every` | `5` | Progress publication interval (files) |
//! | `archive.format` | `zip` | `zip` or `tar.gz` |
//! | `archive.output_dir` | unset | Fixed directory for produced archives |
//! | `archive.retain_finished` | `256` | Finished jobs kept queryable |

use crate::archive::ArchiveSettings;
use crate::error::{Result, ShelfError};
use crate::paths::StorageLayout;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

pub const ENV_STORAGE_PATH: &str = "STORAGE_PATH";
pub const ENV_TRASH_PATH: &str = "TRASH_PATH";
pub const ENV_SHARE_PATH: &str = "SHARE_PATH";
pub const ENV_ARCHIVE_WORKERS: &str = "SHELF_ARCHIVE_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfConfig {
    pub storage_path: PathBuf,
    pub trash_path: PathBuf,
    pub share_path: PathBuf,
    #[serde(default)]
    pub archive: ArchiveSettings,
}

/// What may appear in `config.json`; every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    storage_path: Option<PathBuf>,
    trash_path: Option<PathBuf>,
    share_path: Option<PathBuf>,
    #[serde(default)]
    archive: ArchiveSettings,
}

/// Platform directories used when nothing else is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

pub fn default_dirs() -> Result<ShelfDirs> {
    let dirs = ProjectDirs::from("", "", "shelf")
        .ok_or_else(|| ShelfError::Config("Could not determine home directory".to_string()))?;
    Ok(ShelfDirs {
        config_dir: dirs.config_dir().to_path_buf(),
        data_dir: dirs.data_dir().to_path_buf(),
    })
}

impl ShelfConfig {
    /// Defaults rooted at `data_dir`.
    pub fn default_for(data_dir: &Path) -> Self {
        Self {
            storage_path: data_dir.join("storage"),
            trash_path: data_dir.join("trash"),
            share_path: data_dir.join("shares"),
            archive: ArchiveSettings::default(),
        }
    }

    /// Load `config.json` from `config_dir`, filling gaps from
    /// [`default_for`](Self::default_for). A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(config_dir: P, data_dir: &Path) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);
        let defaults = Self::default_for(data_dir);

        if !config_path.exists() {
            return Ok(defaults);
        }

        let content = fs::read_to_string(&config_path).map_err(ShelfError::Io)?;
        let file: ConfigFile = serde_json::from_str(&content).map_err(ShelfError::Serialization)?;
        tracing::debug!(path = %config_path.display(), "Loaded config");

        Ok(Self {
            storage_path: file.storage_path.unwrap_or(defaults.storage_path),
            trash_path: file.trash_path.unwrap_or(defaults.trash_path),
            share_path: file.share_path.unwrap_or(defaults.share_path),
            archive: file.archive,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(ShelfError::Io)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ShelfError::Serialization)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content).map_err(ShelfError::Io)?;
        Ok(())
    }

    /// Apply environment overrides through `lookup`, which is
    /// `std::env::var` in production.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_STORAGE_PATH) {
            self.storage_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_TRASH_PATH) {
            self.trash_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(ENV_SHARE_PATH) {
            self.share_path = PathBuf::from(path);
        }
        if let Some(workers) = non_empty(ENV_ARCHIVE_WORKERS) {
            self.archive.workers = workers.trim().parse().map_err(|_| {
                ShelfError::Config(format!(
                    "{} must be a positive integer, got {:?}",
                    ENV_ARCHIVE_WORKERS, workers
                ))
            })?;
        }
        Ok(self)
    }

    pub fn from_env(self) -> Result<Self> {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(
            self.storage_path.clone(),
            self.trash_path.clone(),
            self.share_path.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ShelfConfig::load(tmp.path().join("cfg"), Path::new("/data")).unwrap();
        assert_eq!(config, ShelfConfig::default_for(Path::new("/data")));
        assert_eq!(config.trash_path, PathBuf::from("/data/trash"));
        assert_eq!(config.archive.workers, 2);
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = ShelfConfig::default_for(tmp.path());
        config.archive.progress_every = 10;
        config.archive.output_dir = Some(tmp.path().join("out"));
        config.save(tmp.path()).unwrap();

        let loaded = ShelfConfig::load(tmp.path(), Path::new("/elsewhere")).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_gaps() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"{"storage_path": "/srv/files", "archive": {"format": "tar.gz"}}"#,
        )
        .unwrap();

        let config = ShelfConfig::load(tmp.path(), Path::new("/data")).unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/srv/files"));
        assert_eq!(config.share_path, PathBuf::from("/data/shares"));
        assert_eq!(config.archive.format, crate::archive::ArchiveFormat::TarGz);
        assert_eq!(config.archive.progress_every, 5);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "{nope").unwrap();
        assert!(matches!(
            ShelfConfig::load(tmp.path(), Path::new("/data")),
            Err(ShelfError::Serialization(_))
        ));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_STORAGE_PATH, "/mnt/storage"),
            (ENV_TRASH_PATH, ""),
            (ENV_ARCHIVE_WORKERS, "4"),
        ]
        .into_iter()
        .collect();

        let config = ShelfConfig::default_for(Path::new("/data"))
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.storage_path, PathBuf::from("/mnt/storage"));
        assert_eq!(config.trash_path, PathBuf::from("/data/trash"));
        assert_eq!(config.archive.workers, 4);
    }

    #[test]
    fn bad_worker_count_is_rejected() {
        let result = ShelfConfig::default_for(Path::new("/data"))
            .with_env_overrides(|key| (key == ENV_ARCHIVE_WORKERS).then(|| "many".to_string()));
        assert!(matches!(result, Err(ShelfError::Config(_))));
    }
}
