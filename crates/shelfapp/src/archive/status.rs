use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque job identifier handed back on submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used to keep archive names apart.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Snapshot of a job as seen by pollers.
///
/// Serializes as the status payload, tagged on `state`:
/// `{"state": "PROGRESS", "current": 5, "total": 12, "percent": 41, "status": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Progress {
        current: u64,
        total: u64,
        percent: u8,
        status: String,
    },
    Success {
        current: u64,
        total: u64,
        percent: u8,
        /// Absolute path of the produced archive.
        result: PathBuf,
        filename: String,
        total_files: u64,
    },
    Failure {
        error: String,
    },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success { .. } | JobStatus::Failure { .. })
    }

    pub fn state_name(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Progress { .. } => "PROGRESS",
            JobStatus::Success { .. } => "SUCCESS",
            JobStatus::Failure { .. } => "FAILURE",
        }
    }

    /// Processed-file count, where the state carries one.
    pub fn current(&self) -> Option<u64> {
        match self {
            JobStatus::Progress { current, .. } | JobStatus::Success { current, .. } => {
                Some(*current)
            }
            _ => None,
        }
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            JobStatus::Progress { percent, .. } | JobStatus::Success { percent, .. } => {
                Some(*percent)
            }
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` keeps the job's history valid:
    /// finished jobs never change, nothing goes back to pending, and the
    /// processed count never decreases.
    pub fn can_advance_to(&self, next: &JobStatus) -> bool {
        if self.is_terminal() || matches!(next, JobStatus::Pending) {
            return false;
        }
        match (self.current(), next.current()) {
            (Some(now), Some(then)) => then >= now,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(current: u64) -> JobStatus {
        JobStatus::Progress {
            current,
            total: 10,
            percent: (current * 10) as u8,
            status: "Compressing".into(),
        }
    }

    #[test]
    fn payload_is_tagged_on_state() {
        let json = serde_json::to_value(progress(5)).unwrap();
        assert_eq!(json["state"], "PROGRESS");
        assert_eq!(json["current"], 5);
        assert_eq!(json["percent"], 50);

        let pending = serde_json::to_value(JobStatus::Pending).unwrap();
        assert_eq!(pending, serde_json::json!({"state": "PENDING"}));

        let failure = serde_json::to_value(JobStatus::Failure {
            error: "disk full".into(),
        })
        .unwrap();
        assert_eq!(failure["state"], "FAILURE");
        assert_eq!(failure["error"], "disk full");
    }

    #[test]
    fn progress_only_moves_forward() {
        assert!(JobStatus::Pending.can_advance_to(&progress(1)));
        assert!(progress(5).can_advance_to(&progress(5)));
        assert!(progress(5).can_advance_to(&progress(6)));
        assert!(!progress(6).can_advance_to(&progress(5)));
        assert!(!progress(6).can_advance_to(&JobStatus::Pending));
    }

    #[test]
    fn terminal_states_are_frozen() {
        let failed = JobStatus::Failure {
            error: "boom".into(),
        };
        assert!(failed.is_terminal());
        assert!(!failed.can_advance_to(&progress(10)));
        assert!(progress(3).can_advance_to(&failed));
    }

    #[test]
    fn short_job_id() {
        let id = JobId::from("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(JobId::from("abc").short(), "abc");
    }
}
