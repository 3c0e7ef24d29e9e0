//! Storage layout and path confinement.
//!
//! Every caller-supplied path is relative to the storage root. [`StorageLayout::resolve`]
//! rejects absolute paths and any `..` component before joining, so nothing
//! outside the root can be addressed through the public API.

use crate::error::{Result, ShelfError};
use std::fs;
use std::path::{Component, Path, PathBuf};

const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub root: PathBuf,
    pub trash: PathBuf,
    pub shares: PathBuf,
}

impl StorageLayout {
    pub fn new(root: PathBuf, trash: PathBuf, shares: PathBuf) -> Self {
        Self {
            root,
            trash,
            shares,
        }
    }

    /// Create the root, trash and share directories if they are missing.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.trash, &self.shares] {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(ShelfError::Io)?;
            }
        }
        Ok(())
    }

    pub fn trash_metadata(&self) -> PathBuf {
        self.trash.join(METADATA_FILE)
    }

    pub fn share_metadata(&self) -> PathBuf {
        self.shares.join(METADATA_FILE)
    }

    /// Where a trashed item with the given id lives on disk.
    pub fn trash_item(&self, id: &str) -> Result<PathBuf> {
        ensure_single_component(id)?;
        Ok(self.trash.join(id))
    }

    /// Join a root-relative path onto the storage root.
    ///
    /// An empty path resolves to the root itself.
    pub fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let rel = normalize_rel(rel)?;
        Ok(self.root.join(rel))
    }

    /// Like [`resolve`](Self::resolve), also returning the cleaned
    /// `/`-separated form of `rel` for storing in records.
    pub fn locate(&self, rel: &str) -> Result<(PathBuf, String)> {
        let clean = normalize_rel(rel)?;
        Ok((self.root.join(&clean), to_slash(&clean)))
    }

    /// Inverse of [`resolve`](Self::resolve): the `/`-separated path of `abs`
    /// relative to the root, if it lives under it.
    pub fn relative(&self, abs: &Path) -> Option<String> {
        let rel = abs.strip_prefix(&self.root).ok()?;
        Some(to_slash(rel))
    }
}

/// Validate a relative path and return it with `.` components dropped.
pub fn normalize_rel(rel: &str) -> Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ShelfError::InvalidPath(rel.to_string()));
            }
        }
    }
    Ok(out)
}

/// A bare file name: no separators, no `.`/`..`, not empty.
pub fn ensure_single_component(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(ShelfError::InvalidPath(name.to_string())),
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Last component of a `/`-separated relative path.
pub fn base_name(rel: &str) -> String {
    Path::new(rel)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| rel.to_string())
}
