//! Concrete `SmbBackend` wrapping the `smb` crate's async client
//! (spec.md §4.2), grounded in the CLI's own usage in `copy.rs`/`watch.rs`:
//! one `Client` per process, `share_connect` before any path under a new
//! share, `create_file` + `FileCreateArgs` to open a resource, `TryInto`
//! to narrow it down to a `Directory` or `File`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use smb::resource::{Directory, Resource};
use smb::{Client, ClientConfig, DirAccessMask, FileAccessMask, FileCreateArgs, UncPath};
use smb_fscc::FileIdBothDirectoryInformation;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::process::Command;

use crate::error::{CoreError, Result};

use super::temp::TempRegistry;
use super::{SmbBackend, SmbEndpoint, SmbEntry, WalkEntry};

const COMMON_SHARE_NAMES: &[&str] = &[
    "homes", "home", "music", "video", "photo", "public", "documents", "downloads", "media",
    "backup", "data", "share", "shared", "files", "nas",
];

const DISCOVER_TIMEOUT: Duration = Duration::from_secs(15);

/// Registered sessions are keyed by host so re-indexing several sources on
/// the same NAS box doesn't re-authenticate per source.
pub struct SmbClientBackend {
    client: Client,
    registered_hosts: Mutex<HashSet<String>>,
    temp: TempRegistry,
}

impl SmbClientBackend {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        let client = Client::new(ClientConfig::default());
        let temp = TempRegistry::new(cache_dir.join("_smb_temp"))?;
        Ok(Self {
            client,
            registered_hosts: Mutex::new(HashSet::new()),
            temp,
        })
    }

    fn unc(path: &str) -> Result<UncPath> {
        path.parse()
            .map_err(|e| CoreError::InvalidConfig(format!("invalid SMB path {path}: {e:?}")))
    }

    async fn open_dir(&self, smb_path: &str) -> Result<Directory> {
        let unc = Self::unc(smb_path)?;
        let resource = self
            .client
            .create_file(
                &unc,
                &FileCreateArgs::make_open_existing(
                    DirAccessMask::new().with_list_directory(true).into(),
                ),
            )
            .await
            .map_err(map_smb_err)?;
        resource
            .try_into()
            .map_err(|_| CoreError::InvalidConfig(format!("{smb_path} is not a directory")))
    }
}

#[async_trait]
impl SmbBackend for SmbClientBackend {
    async fn register_source(&self, endpoint: &SmbEndpoint) -> Result<()> {
        let mut hosts = self.registered_hosts.lock().unwrap();
        if hosts.contains(&endpoint.host) {
            return Ok(());
        }
        let unc = Self::unc(&endpoint.smb_root())?;
        self.client
            .share_connect(&unc, &endpoint.username, endpoint.password.clone())
            .await
            .map_err(map_smb_err)?;
        hosts.insert(endpoint.host.clone());
        Ok(())
    }

    async fn walk(&self, endpoint: &SmbEndpoint) -> Result<Vec<WalkEntry>> {
        let root = endpoint.smb_root();
        let mut out = Vec::new();
        let mut stack = vec![root];

        while let Some(dir_path) = stack.pop() {
            let dir = match self.open_dir(&dir_path).await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(path = %dir_path, error = %e, "SMB walk: failed to open directory");
                    continue;
                }
            };

            let mut entries = Vec::new();
            let mut stream = dir.query::<FileIdBothDirectoryInformation>("*");
            while let Some(item) = stream.next().await {
                let info = match item {
                    Ok(info) => info,
                    Err(e) => {
                        tracing::debug!(path = %dir_path, error = %e, "SMB directory entry read failed");
                        continue;
                    }
                };
                let name = info.file_name.to_string();
                if name == "." || name == ".." {
                    continue;
                }
                let is_directory = info.file_attributes.directory();
                let child_path = format!("{dir_path}\\{name}");
                entries.push(SmbEntry {
                    name: name.clone(),
                    smb_path: child_path.clone(),
                    is_directory,
                    size: info.end_of_file as i64,
                    modified_at: filetime_to_utc(info.last_write_time),
                    created_at: filetime_to_utc(info.creation_time),
                });
                if is_directory {
                    stack.push(child_path);
                }
            }

            out.push(WalkEntry { dir_smb_path: dir_path, entries });
        }

        Ok(out)
    }

    async fn stat(&self, smb_path: &str) -> Result<Option<SmbEntry>> {
        let unc = Self::unc(smb_path)?;
        let resource = match self
            .client
            .create_file(
                &unc,
                &FileCreateArgs::make_open_existing(FileAccessMask::new().with_generic_read(true)),
            )
            .await
        {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };

        let name = smb_path.replace('\\', "/").rsplit('/').next().unwrap_or(smb_path).to_string();
        let is_directory = matches!(resource, Resource::Directory(_));
        let size = match &resource {
            Resource::File(f) => f.get_len().await.unwrap_or(0) as i64,
            _ => 0,
        };

        Ok(Some(SmbEntry {
            name,
            smb_path: smb_path.to_string(),
            is_directory,
            size,
            modified_at: None,
            created_at: None,
        }))
    }

    async fn read_bytes(&self, smb_path: &str, max_bytes: u64) -> Result<Vec<u8>> {
        let unc = Self::unc(smb_path)?;
        let resource = self
            .client
            .create_file(
                &unc,
                &FileCreateArgs::make_open_existing(FileAccessMask::new().with_generic_read(true)),
            )
            .await
            .map_err(map_smb_err)?;
        let mut file = resource
            .unwrap_file();
        let mut buf = Vec::new();
        if max_bytes > 0 {
            let mut limited = (&mut file).take(max_bytes);
            limited.read_to_end(&mut buf).await.map_err(CoreError::Io)?;
        } else {
            file.read_to_end(&mut buf).await.map_err(CoreError::Io)?;
        }
        Ok(buf)
    }

    async fn read_tail(&self, smb_path: &str, tail_bytes: u64) -> Result<Vec<u8>> {
        let unc = Self::unc(smb_path)?;
        let resource = self
            .client
            .create_file(
                &unc,
                &FileCreateArgs::make_open_existing(FileAccessMask::new().with_generic_read(true)),
            )
            .await
            .map_err(map_smb_err)?;
        let mut file = resource.unwrap_file();
        file.seek(SeekFrom::End(-(tail_bytes as i64))).await.map_err(CoreError::Io)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(CoreError::Io)?;
        Ok(buf)
    }

    async fn download_to_temp(&self, smb_path: &str) -> Result<PathBuf> {
        let name = smb_path.replace('\\', "/");
        let name = name.rsplit('/').next().unwrap_or(&name);
        let local_path = self.temp.reserve(name);

        let data = self.read_bytes(smb_path, 0).await?;
        tokio::fs::write(&local_path, &data).await.map_err(CoreError::Io)?;
        Ok(local_path)
    }

    fn cleanup_temp(&self, path: &std::path::Path) {
        self.temp.cleanup(path);
    }

    async fn discover_shares(&self, host: &str, username: &str, password: &str) -> Vec<String> {
        if let Some(shares) = discover_shares_via_cli(host, username, password).await {
            return shares;
        }

        let mut found = Vec::new();
        for name in COMMON_SHARE_NAMES {
            let probe = format!("\\\\{host}\\{name}");
            if self.stat(&probe).await.ok().flatten().is_some() {
                found.push(name.to_string());
            }
        }
        found
    }

    async fn test_connection(&self, endpoint: &SmbEndpoint) -> Result<String> {
        self.register_source(endpoint).await?;
        let root = endpoint.smb_root();
        let dir = self.open_dir(&root).await?;
        let mut stream = dir.query::<FileIdBothDirectoryInformation>("*");
        let mut count = 0usize;
        while let Some(item) = stream.next().await {
            if item.is_ok() {
                count += 1;
            }
        }
        Ok(format!("Connected successfully. Found {count} items in share root."))
    }
}

async fn discover_shares_via_cli(host: &str, username: &str, password: &str) -> Option<Vec<String>> {
    let output = tokio::time::timeout(
        DISCOVER_TIMEOUT,
        Command::new("smbclient")
            .arg("-L")
            .arg(host)
            .arg("-U")
            .arg(format!("{username}%{password}"))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let mut shares = Vec::new();
    let mut in_shares = false;
    for line in text.lines() {
        let line = line.trim();
        if line.contains("Sharename") && line.contains("Type") {
            in_shares = true;
            continue;
        }
        if in_shares && line.starts_with("---") {
            continue;
        }
        if in_shares && line.is_empty() {
            break;
        }
        if in_shares {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 && parts[1] == "Disk" && !parts[0].ends_with('$') {
                shares.push(parts[0].to_string());
            }
        }
    }

    if shares.is_empty() {
        None
    } else {
        Some(shares)
    }
}

fn map_smb_err(err: smb::Error) -> CoreError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("logon") || lower.contains("access_denied") || lower.contains("auth") {
        CoreError::Auth(msg)
    } else if lower.contains("bad_network_name") || lower.contains("not_found") || lower.contains("no such") {
        CoreError::NotFound(msg)
    } else if lower.contains("timeout") || lower.contains("timed out") {
        CoreError::Timeout(msg)
    } else if lower.contains("unreachable") || lower.contains("connection refused") {
        CoreError::Unreachable(msg)
    } else {
        CoreError::Transient(msg)
    }
}

fn filetime_to_utc(ft: smb_fscc::FileTime) -> Option<DateTime<Utc>> {
    let odt: time::OffsetDateTime = ft.try_into().ok()?;
    DateTime::from_timestamp(odt.unix_timestamp(), odt.nanosecond())
}
