//! Byte formatting and disk usage sampling for display.
//!
//! Nothing in here feeds an invariant; failures degrade to placeholder values.

use serde::Serialize;
use std::fs;
use std::path::Path;
use sysinfo::Disks;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with two decimals in binary units, e.g. `1.50 KB`.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

/// Size string for a file, `-` for directories or anything unreadable.
pub fn size_str(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => human_size(meta.len()),
        Ok(_) => "-".to_string(),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Could not stat item for size");
            "-".to_string()
        }
    }
}

/// Disk usage of the filesystem holding a directory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskUsage {
    pub used: u64,
    pub total: u64,
    pub percent: f64,
}

impl DiskUsage {
    pub fn from_space(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        let percent = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        Self {
            used,
            total,
            percent,
        }
    }

    pub fn used_str(&self) -> String {
        human_size(self.used)
    }

    pub fn total_str(&self) -> String {
        human_size(self.total)
    }
}

impl Default for DiskUsage {
    fn default() -> Self {
        Self::from_space(0, 0)
    }
}

/// Sample usage for the disk whose mount point is the longest prefix of
/// `root`. Returns zeros when no disk matches.
pub fn usage(root: &Path) -> DiskUsage {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let disks = Disks::new_with_refreshed_list();

    let best = disks
        .list()
        .iter()
        .filter(|disk| root.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count());

    match best {
        Some(disk) => DiskUsage::from_space(disk.total_space(), disk.available_space()),
        None => {
            tracing::warn!(root = %root.display(), "No mounted disk found for storage root");
            DiskUsage::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_small_values_in_bytes() {
        assert_eq!(human_size(0), "0.00 B");
        assert_eq!(human_size(10), "10.00 B");
        assert_eq!(human_size(1023), "1023.00 B");
    }

    #[test]
    fn formats_binary_units() {
        assert_eq!(human_size(1024), "1.00 KB");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(human_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn overflows_into_petabytes() {
        assert_eq!(human_size(2 * 1024u64.pow(5)), "2.00 PB");
    }

    #[test]
    fn size_str_of_file_and_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"0123456789").unwrap();
        assert_eq!(size_str(&file), "10.00 B");
        assert_eq!(size_str(dir.path()), "-");
        assert_eq!(size_str(&dir.path().join("missing")), "-");
    }

    #[test]
    fn usage_percent_handles_zero_total() {
        let usage = DiskUsage::from_space(0, 0);
        assert_eq!(usage.percent, 0.0);
        assert_eq!(usage.used_str(), "0.00 B");
    }

    #[test]
    fn usage_percent_from_space() {
        let usage = DiskUsage::from_space(1000, 250);
        assert_eq!(usage.used, 750);
        assert!((usage.percent - 75.0).abs() < f64::EPSILON);
    }
}
