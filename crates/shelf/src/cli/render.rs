use colored::Colorize;
use serde::Serialize;
use shelfapp::Result;
use shelfapp::archive::JobStatus;
use shelfapp::commands::BatchOutcome;
use shelfapp::commands::files::FileEntry;
use shelfapp::model::{ShareEntry, ShareStatus, TIMESTAMP_FORMAT, TrashEntry};
use shelfapp::size::DiskUsage;

const SIZE_WIDTH: usize = 11;
const BAR_WIDTH: usize = 30;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_files(entries: &[FileEntry]) -> String {
    if entries.is_empty() {
        return "Nothing here.".dimmed().to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let name = if entry.is_dir {
                format!("{}/", entry.path).blue().bold().to_string()
            } else {
                entry.path.clone()
            };
            format!(
                "{:>width$}  {}  {}",
                entry.size,
                entry.modified.dimmed(),
                name,
                width = SIZE_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_trash(entries: &[TrashEntry]) -> String {
    if entries.is_empty() {
        return "Trash is empty.".dimmed().to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let kind = if entry.is_dir { "dir " } else { "file" };
            format!(
                "{}  {}  {:>width$}  {}  {}",
                entry.id.yellow(),
                entry.deleted_at.format(TIMESTAMP_FORMAT).to_string().dimmed(),
                entry.size,
                kind,
                entry.path,
                width = SIZE_WIDTH
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_shares(entries: &[ShareEntry]) -> String {
    if entries.is_empty() {
        return "No shares.".dimmed().to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let status = match entry.status {
                ShareStatus::Normal => entry.status.to_string().green(),
                ShareStatus::Lost => entry.status.to_string().red(),
            };
            format!(
                "{}  {}  {:>4} downloads  {:<6}  {}",
                entry.id.yellow(),
                entry.created_at.format(TIMESTAMP_FORMAT).to_string().dimmed(),
                entry.downloads,
                status,
                entry.path
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Successful items on stdout, failures on stderr.
pub fn print_outcome(verb: &str, outcome: &BatchOutcome) {
    for item in &outcome.items {
        println!("{} {}", verb.green(), item);
    }
    for error in &outcome.errors {
        eprintln!("{} {}", "failed:".red(), error);
    }
}

pub fn format_usage(usage: &DiskUsage) -> String {
    let filled = ((usage.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
    let bar = if usage.percent >= 90.0 {
        bar.red()
    } else {
        bar.normal()
    };
    format!(
        "[{}] {:.1}%  {} of {} used",
        bar,
        usage.percent,
        usage.used_str(),
        usage.total_str()
    )
}

/// One line per progress snapshot, `None` for states with nothing to say.
pub fn format_progress(status: &JobStatus) -> Option<String> {
    match status {
        JobStatus::Pending => Some("queued".dimmed().to_string()),
        JobStatus::Progress {
            current,
            total,
            percent,
            status,
        } => Some(format!("[{:>3}%] {}/{} {}", percent, current, total, status.dimmed())),
        JobStatus::Success { .. } | JobStatus::Failure { .. } => None,
    }
}

pub fn format_job_result(status: &JobStatus) -> String {
    match status {
        JobStatus::Success {
            result,
            total_files,
            ..
        } => format!(
            "{} {} ({} files)",
            "Archive ready:".green(),
            result.display(),
            total_files
        ),
        JobStatus::Failure { error } => format!("{} {}", "Archive failed:".red(), error),
        other => format!("Archive still {}", other.state_name().to_lowercase()),
    }
}
