use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::logical_path::LogicalPath;

/// The MIME type fixed for every directory row (spec.md §3).
pub const DIRECTORY_MIME: &str = "inode/directory";

/// One row per directory or file observed under any source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRow {
    pub id: i64,
    pub path: LogicalPath,
    pub name: String,
    /// Logical path of the parent directory, or empty for source roots.
    pub parent_path: String,
    pub is_directory: bool,
    pub size: i64,
    pub mime_type: String,
    /// 16 hex chars, or `None`. Absence means enrichment has not yet run.
    ///
    /// This is a *similarity hint* (spec.md §4.6 step 2, §9(c)): equal
    /// hashes on equal-size files are probably, never certainly, the same
    /// content. Never present two files with matching hashes as confirmed
    /// duplicates — call them probable duplicates.
    pub file_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub indexed_at: DateTime<Utc>,
    /// Extracted searchable text, truncated to `max_text_store_kb`, or
    /// `None` if extraction hasn't run or produced nothing.
    pub full_text: Option<String>,
}

impl FileRow {
    pub fn is_enriched(&self) -> bool {
        self.file_hash.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Rule,
    User,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Rule => "rule",
            TagType::User => "user",
        }
    }
}

impl std::str::FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(TagType::Rule),
            "user" => Ok(TagType::User),
            other => Err(format!("unknown tag_type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRow {
    pub file_id: i64,
    pub tag: String,
    pub tag_type: TagType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRow {
    pub file_id: i64,
    pub metadata: super::media_metadata::MediaMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Cancelled => "cancelled",
            ScanStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for ScanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(ScanStatus::Running),
            "completed" => Ok(ScanStatus::Completed),
            "cancelled" => Ok(ScanStatus::Cancelled),
            "failed" => Ok(ScanStatus::Failed),
            other => Err(format!("unknown scan status: {other}")),
        }
    }
}

/// Append-only scan history entry (spec.md §3, §6 `scan_log` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogRow {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ScanStatus,
    pub files_scanned: i64,
    pub files_added: i64,
    pub files_updated: i64,
    pub files_removed: i64,
    pub errors: i64,
    /// Bounded to the last 100 messages (spec.md §4.7, §7).
    pub error_log: Vec<String>,
}
