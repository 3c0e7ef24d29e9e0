use crate::paths::to_slash;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file to put into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub source: PathBuf,
    /// `/`-separated name inside the archive.
    pub entry_name: String,
}

/// Expand requested paths into the ordered list of files to archive.
///
/// - a file is stored under its base name
/// - a directory contributes every file below it, in file-name order, named
///   relative to the directory's parent so the tree is rooted at the
///   directory's own name
/// - paths that do not exist contribute nothing
pub fn expand(paths: &[PathBuf]) -> Vec<PlannedEntry> {
    let mut plan = Vec::new();
    for path in paths {
        if path.is_file() {
            if let Some(name) = path.file_name() {
                plan.push(PlannedEntry {
                    source: path.clone(),
                    entry_name: name.to_string_lossy().into_owned(),
                });
            }
        } else if path.is_dir() {
            expand_dir(path, &mut plan);
        } else {
            tracing::debug!(path = %path.display(), "Skipping missing archive source");
        }
    }
    plan
}

fn expand_dir(dir: &Path, plan: &mut Vec<PlannedEntry>) {
    let anchor = dir.parent().unwrap_or(dir);
    let walker = WalkDir::new(dir).sort_by_file_name().into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(anchor) {
            plan.push(PlannedEntry {
                source: entry.path().to_path_buf(),
                entry_name: to_slash(rel),
            });
        }
    }
}
