//! Filesystem primitives shared by the trash and file workflows.

use crate::error::{Result, ShelfError};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use walkdir::WalkDir;

/// Move `from` to `to`, copying and removing when a rename cannot cross
/// filesystems. `to` must not exist.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                "Rename crosses devices, copying instead"
            );
            copy_recursive(from, to)?;
            remove_path(from)
        }
        Err(e) => Err(ShelfError::Io(e)),
    }
}

/// Copy a file, or a directory tree, to `to`.
pub fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
    let meta = fs::metadata(from).map_err(ShelfError::Io)?;
    if !meta.is_dir() {
        fs::copy(from, to).map_err(ShelfError::Io)?;
        return Ok(());
    }

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|e| ShelfError::Io(e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| ShelfError::InvalidPath(entry.path().display().to_string()))?;
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(ShelfError::Io)?;
        } else {
            fs::copy(entry.path(), &dest).map_err(ShelfError::Io)?;
        }
    }
    Ok(())
}

/// Remove a file or a whole directory tree.
pub fn remove_path(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(ShelfError::Io)?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(ShelfError::Io)
    } else {
        fs::remove_file(path).map_err(ShelfError::Io)
    }
}

/// Whether anything, including a dangling symlink, exists at `path`.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Whether `path` leads to something readable, following symlinks. A
/// dangling symlink is not reachable.
pub fn reachable(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}
