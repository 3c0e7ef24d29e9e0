use super::BatchOutcome;
use crate::error::{Result, ShelfError};
use crate::fsops;
use crate::paths::{StorageLayout, base_name, ensure_single_component, to_slash};
use crate::size::human_size;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, File, Metadata};
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;
use std::time::SystemTime;
use walkdir::WalkDir;

const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row of a directory or category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
    /// Human-readable size, `-` for directories.
    pub size: String,
    /// Local modification time, `YYYY-MM-DD HH:MM`.
    pub modified: String,
    /// `/`-separated path relative to the storage root.
    pub path: String,
    #[serde(skip)]
    mtime: Option<SystemTime>,
}

impl FileEntry {
    fn from_metadata(name: String, path: String, meta: &Metadata) -> Self {
        let mtime = meta.modified().ok();
        let modified = mtime
            .map(|t| DateTime::<Local>::from(t).format(MODIFIED_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string());
        let is_dir = meta.is_dir();
        Self {
            name,
            is_dir,
            size: if is_dir { "-".to_string() } else { human_size(meta.len()) },
            modified,
            path,
            mtime,
        }
    }
}

/// File type groups used for the category views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Image,
    Video,
    Doc,
    App,
}

impl Category {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Image => &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "ico"],
            Category::Video => &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp"],
            Category::Doc => &[
                "txt", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "md", "csv", "json",
            ],
            Category::App => &["exe", "dmg", "pkg", "apk", "ipa", "deb", "rpm", "msi"],
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}

impl FromStr for Category {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(Category::Image),
            "video" => Ok(Category::Video),
            "doc" => Ok(Category::Doc),
            "app" => Ok(Category::App),
            other => Err(ShelfError::NotFound(format!("category {}", other))),
        }
    }
}

/// Entries of one directory, directories first, then by name.
///
/// A directory that does not exist lists as empty.
pub fn list_dir(layout: &StorageLayout, rel: &str) -> Result<Vec<FileEntry>> {
    let (dir, clean) = layout.locate(rel)?;
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(&dir).map_err(ShelfError::Io)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Could not stat entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = if clean.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", clean, name)
        };
        entries.push(FileEntry::from_metadata(name, path, &meta));
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

/// Every file under the root in `category`, newest first.
pub fn list_category(layout: &StorageLayout, category: Category) -> Vec<FileEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(&layout.root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !category.matches(entry.path()) {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        let Ok(rel) = entry.path().strip_prefix(&layout.root) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        entries.push(FileEntry::from_metadata(name, to_slash(rel), &meta));
    }

    entries.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.path.cmp(&b.path)));
    entries
}

/// Create `name` inside `parent` and return its relative path.
pub fn mkdir(layout: &StorageLayout, parent: &str, name: &str) -> Result<String> {
    ensure_single_component(name)?;
    let (parent_abs, parent_rel) = layout.locate(parent)?;
    let target = parent_abs.join(name);
    let rel = join_rel(&parent_rel, name);
    if fsops::exists(&target) {
        return Err(ShelfError::AlreadyExists(rel));
    }
    fs::create_dir_all(&target).map_err(ShelfError::Io)?;
    tracing::info!(path = %rel, "Created directory");
    Ok(rel)
}

/// Rename an item in place and return its new relative path.
pub fn rename(layout: &StorageLayout, rel: &str, new_name: &str) -> Result<String> {
    ensure_single_component(new_name)?;
    let (source, clean) = layout.locate(rel)?;
    if clean.is_empty() {
        return Err(ShelfError::InvalidPath("cannot rename the storage root".to_string()));
    }
    if !fsops::exists(&source) {
        return Err(ShelfError::NotFound(clean));
    }

    let parent_rel = Path::new(&clean)
        .parent()
        .map(to_slash)
        .unwrap_or_default();
    let new_rel = join_rel(&parent_rel, new_name);
    let (target, _) = layout.locate(&new_rel)?;
    if fsops::exists(&target) {
        return Err(ShelfError::AlreadyExists(new_rel));
    }

    fs::rename(&source, &target).map_err(ShelfError::Io)?;
    tracing::info!(from = %clean, to = %new_rel, "Renamed item");
    Ok(new_rel)
}

/// Store the bytes of `content` as `dest_dir/name`, creating `dest_dir` if
/// needed, and return the new relative path.
///
/// An existing file of that name is replaced; the new content is written to
/// a hidden sibling first so readers never see a half-written file.
pub fn put<R: Read + ?Sized>(layout: &StorageLayout, dest_dir: &str, name: &str, content: &mut R) -> Result<String> {
    ensure_single_component(name)?;
    let (dir_abs, dir_rel) = layout.locate(dest_dir)?;
    let target = dir_abs.join(name);
    let rel = join_rel(&dir_rel, name);
    if target.is_dir() {
        return Err(ShelfError::AlreadyExists(rel));
    }
    fs::create_dir_all(&dir_abs)?;

    let staging = dir_abs.join(format!(".{}.upload", name));
    let written = write_staged(&staging, content).and_then(|bytes| {
        fs::rename(&staging, &target)?;
        Ok(bytes)
    });
    match written {
        Ok(bytes) => {
            tracing::info!(path = %rel, bytes, "Stored file");
            Ok(rel)
        }
        Err(e) => {
            let _ = fs::remove_file(&staging);
            Err(e)
        }
    }
}

fn write_staged<R: Read + ?Sized>(staging: &Path, content: &mut R) -> Result<u64> {
    let mut file = File::create(staging)?;
    let bytes = io::copy(content, &mut file)?;
    file.sync_all()?;
    Ok(bytes)
}

/// Copy the raw content of the file at `rel` into `out`, returning the
/// number of bytes.
pub fn read<W: Write + ?Sized>(layout: &StorageLayout, rel: &str, out: &mut W) -> Result<u64> {
    let (abs, clean) = layout.locate(rel)?;
    if abs.is_dir() {
        return Err(ShelfError::InvalidPath(format!("{} is a directory", clean)));
    }
    let mut file = match File::open(&abs) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ShelfError::NotFound(clean)),
        Err(e) => return Err(ShelfError::Io(e)),
    };
    let bytes = io::copy(&mut file, out)?;
    out.flush()?;
    Ok(bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Move,
    Copy,
}

/// Move or copy items into the directory `dest`. `items` holds the new
/// relative paths.
///
/// Fails as a whole only when `dest` is not an existing directory.
pub fn transfer<S: AsRef<str>>(
    layout: &StorageLayout,
    mode: Transfer,
    paths: &[S],
    dest: &str,
) -> Result<BatchOutcome> {
    let (dest_abs, dest_rel) = layout.locate(dest)?;
    if !dest_abs.is_dir() {
        return Err(ShelfError::NotFound(dest_rel));
    }

    let mut outcome = BatchOutcome::new();
    for rel in paths {
        let rel = rel.as_ref();
        match transfer_one(layout, mode, rel, &dest_abs, &dest_rel) {
            Ok(new_rel) => outcome.ok(new_rel),
            Err(e) => outcome.fail(rel, e),
        }
    }
    tracing::info!(
        mode = ?mode,
        dest = %dest_rel,
        success = outcome.success,
        failed = outcome.errors.len(),
        "Transfer finished"
    );
    Ok(outcome)
}

fn transfer_one(
    layout: &StorageLayout,
    mode: Transfer,
    rel: &str,
    dest_abs: &Path,
    dest_rel: &str,
) -> Result<String> {
    let (source, clean) = layout.locate(rel)?;
    if clean.is_empty() {
        return Err(ShelfError::InvalidPath("cannot move the storage root".to_string()));
    }
    if !fsops::exists(&source) {
        return Err(ShelfError::NotFound(clean));
    }

    let name = base_name(&clean);
    let target = dest_abs.join(&name);
    let new_rel = join_rel(dest_rel, &name);
    if target.starts_with(&source) {
        return Err(ShelfError::InvalidPath(format!("{} into itself", clean)));
    }
    if fsops::exists(&target) {
        return Err(ShelfError::AlreadyExists(new_rel));
    }

    match mode {
        Transfer::Move => fsops::move_path(&source, &target)?,
        Transfer::Copy => fsops::copy_recursive(&source, &target)?,
    }
    Ok(new_rel)
}

fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
