//! SMB access layer (spec.md §4.2): a narrow `SmbBackend` trait wrapping
//! the real SMB client, so the rest of the crate never depends on its
//! concrete connection/session machinery directly.

mod client;
mod path;
mod temp;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

pub use client::SmbClientBackend;
pub use path::{guess_mime, mime_for_entry, relative_to_smb, smb_to_relative};
pub use temp::TempRegistry;

/// One SMB endpoint to index: a host, share, optional subfolder, and the
/// label under which its files appear in the catalog (spec.md §3 `Source`).
#[derive(Debug, Clone)]
pub struct SmbEndpoint {
    pub host: String,
    pub share: String,
    pub username: String,
    pub password: String,
    pub subfolder: String,
    pub label: String,
}

impl SmbEndpoint {
    /// UNC-style root of this endpoint, e.g. `\\host\share\sub`.
    pub fn smb_root(&self) -> String {
        let base = format!("\\\\{}\\{}", self.host, self.share);
        let sub = self.subfolder.trim_matches('/').replace('/', "\\");
        if sub.is_empty() {
            base
        } else {
            format!("{base}\\{sub}")
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmbEntry {
    pub name: String,
    pub smb_path: String,
    pub is_directory: bool,
    pub size: i64,
    pub modified_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A single level of `walk`: the directory path and the entries directly
/// inside it (files and subdirectories both), mirroring the original
/// `os.walk`-style generator (spec.md §4.2 `walk`).
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub dir_smb_path: String,
    pub entries: Vec<SmbEntry>,
}

/// The out-of-process collaborator surface spec.md §4.2 describes:
/// registerSource, walk, stat, open/readBytes, download/cleanup temp,
/// discoverShares, testConnection. One implementation wraps the real SMB
/// client; tests substitute an in-memory fake.
#[async_trait]
pub trait SmbBackend: Send + Sync {
    async fn register_source(&self, endpoint: &SmbEndpoint) -> Result<()>;

    /// Depth-first walk of `endpoint`'s root, yielding one `WalkEntry` per
    /// directory visited (itself included, with its immediate children).
    async fn walk(&self, endpoint: &SmbEndpoint) -> Result<Vec<WalkEntry>>;

    async fn stat(&self, smb_path: &str) -> Result<Option<SmbEntry>>;

    /// Reads up to `max_bytes` from the start of the file (`0` means the
    /// whole file), used for text extraction and fingerprint sampling.
    async fn read_bytes(&self, smb_path: &str, max_bytes: u64) -> Result<Vec<u8>>;

    /// Reads the final `tail_bytes` of a file, for the fingerprint's tail
    /// sample on files larger than twice the sample window.
    async fn read_tail(&self, smb_path: &str, tail_bytes: u64) -> Result<Vec<u8>>;

    /// Downloads a remote file to a local temp path for tools that need a
    /// real filesystem path (text/metadata extractors). Returns the path;
    /// caller must pass it to `cleanup_temp`.
    async fn download_to_temp(&self, smb_path: &str) -> Result<std::path::PathBuf>;

    fn cleanup_temp(&self, path: &std::path::Path);

    /// CLI probe (`smbclient -L`) with a curated fallback list if that
    /// binary isn't available (spec.md §4.2 `discoverShares`).
    async fn discover_shares(&self, host: &str, username: &str, password: &str) -> Vec<String>;

    async fn test_connection(&self, endpoint: &SmbEndpoint) -> Result<String>;
}
