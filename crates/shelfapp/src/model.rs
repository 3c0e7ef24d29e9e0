use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wire format for ledger timestamps (local time, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde helper for `NaiveDateTime` as `YYYY-MM-DD HH:MM:SS`.
pub(crate) mod local_timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Current local time truncated to whole seconds, matching what survives a
/// round trip through the metadata files.
pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// A soft-deleted item. The ledger key is the trash id, which is also the
/// name of the item inside the trash directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashRecord {
    pub original_name: String,
    pub original_path: String,
    pub is_dir: bool,
    #[serde(with = "local_timestamp")]
    pub deleted_at: NaiveDateTime,
    #[serde(default = "unknown_size")]
    pub size_str: String,
}

fn unknown_size() -> String {
    "-".to_string()
}

/// Display summary of a trash record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(with = "local_timestamp")]
    pub deleted_at: NaiveDateTime,
    pub size: String,
    pub is_dir: bool,
}

impl TrashEntry {
    pub fn from_record(id: &str, record: &TrashRecord) -> Self {
        Self {
            id: id.to_string(),
            name: record.original_name.clone(),
            path: record.original_path.clone(),
            deleted_at: record.deleted_at,
            size: record.size_str.clone(),
            is_dir: record.is_dir,
        }
    }
}

/// A public share grant for one path under the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub file_path: String,
    pub file_name: String,
    pub is_dir: bool,
    #[serde(with = "local_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub downloads: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Normal,
    Lost,
}

impl std::fmt::Display for ShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShareStatus::Normal => write!(f, "normal"),
            ShareStatus::Lost => write!(f, "lost"),
        }
    }
}

/// Display summary of a share, with liveness computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareEntry {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(with = "local_timestamp")]
    pub created_at: NaiveDateTime,
    pub downloads: u64,
    pub is_dir: bool,
    pub status: ShareStatus,
}
