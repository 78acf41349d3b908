//! Source manager (spec.md §4.3): persists SMB endpoint configuration to a
//! sibling JSON file with encrypted credentials, and derives the stable
//! `source_id` used to key removal and status lookups.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::smb::{SmbBackend, SmbEndpoint};
use crate::vault::CredentialVault;

/// On-disk shape of `nas_connection.json`. `username`/`password` are
/// stored `enc:`-prefixed; legacy plaintext entries are recognized and
/// migrated on next save (spec.md §4.1, ported from `nas_manager.py`'s
/// `save_config`/`load_config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceRecord {
    host: String,
    share: String,
    username: String,
    password: String,
    #[serde(default = "default_subfolder")]
    subfolder: String,
    #[serde(default)]
    label: String,
}

fn default_subfolder() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SourceFile {
    sources: Vec<SourceRecord>,
}

/// A configured, decrypted SMB endpoint plus its stable identifier
/// (spec.md §3 `Source`).
#[derive(Debug, Clone)]
pub struct Source {
    pub source_id: String,
    pub endpoint: SmbEndpoint,
}

impl Source {
    fn id_of(host: &str, share: &str, subfolder: &str) -> String {
        let trimmed = subfolder.trim_end_matches('/');
        if trimmed.is_empty() {
            format!("{host}/{share}")
        } else {
            format!("{host}/{share}{trimmed}")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source_id: String,
    pub host: String,
    pub share: String,
    pub label: String,
    pub subfolder: String,
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub configured: bool,
    pub connected: bool,
    pub sources: Vec<SourceStatus>,
}

pub struct SourceManager {
    path: PathBuf,
    vault: CredentialVault,
}

impl SourceManager {
    pub fn open(path: &Path, key_path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            vault: CredentialVault::open(key_path)?,
        })
    }

    fn load_file(&self) -> Result<SourceFile> {
        if !self.path.exists() {
            return Ok(SourceFile::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: SourceFile = serde_json::from_str(&raw)?;
        Ok(file)
    }

    fn save_file(&self, file: &SourceFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let encrypted = SourceFile {
            sources: file
                .sources
                .iter()
                .map(|r| SourceRecord {
                    host: r.host.clone(),
                    share: r.share.clone(),
                    username: self.encrypt_if_needed(&r.username),
                    password: self.encrypt_if_needed(&r.password),
                    subfolder: r.subfolder.clone(),
                    label: r.label.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&encrypted)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn encrypt_if_needed(&self, value: &str) -> String {
        if CredentialVault::is_encrypted(value) {
            value.to_string()
        } else {
            self.vault.encrypt(value)
        }
    }

    /// Decrypts every record, auto-migrating (re-saving) the file if any
    /// entry was still plaintext.
    fn load_decrypted(&self) -> Result<Vec<SourceRecord>> {
        let file = self.load_file()?;
        let mut needs_resave = false;
        let mut decrypted = Vec::with_capacity(file.sources.len());
        for rec in &file.sources {
            let was_plain_user = !CredentialVault::is_encrypted(&rec.username);
            let was_plain_pass = !CredentialVault::is_encrypted(&rec.password);
            needs_resave |= was_plain_user || was_plain_pass;
            decrypted.push(SourceRecord {
                host: rec.host.clone(),
                share: rec.share.clone(),
                username: self.vault.decrypt(&rec.username)?,
                password: self.vault.decrypt(&rec.password)?,
                subfolder: rec.subfolder.clone(),
                label: rec.label.clone(),
            });
        }
        if needs_resave {
            tracing::info!("migrating plaintext source credentials to encrypted storage");
            self.save_file(&SourceFile { sources: decrypted.clone() })?;
        }
        Ok(decrypted)
    }

    pub fn list_sources(&self) -> Result<Vec<Source>> {
        let records = self.load_decrypted()?;
        Ok(records.into_iter().map(record_to_source).collect())
    }

    /// Adds a source and persists immediately, even if the subsequent SMB
    /// registration fails — a misconfigured source should still be
    /// visible and editable rather than silently dropped (spec.md §9,
    /// decision recorded in the grounding ledger).
    pub async fn add_source(
        &self,
        backend: &dyn SmbBackend,
        host: &str,
        share: &str,
        username: &str,
        password: &str,
        subfolder: &str,
        label: &str,
    ) -> Result<Source> {
        let mut file = self.load_file()?;
        let mut decrypted = self.load_decrypted()?;

        let source_id = Source::id_of(host, share, subfolder);
        if decrypted
            .iter()
            .any(|r| Source::id_of(&r.host, &r.share, &r.subfolder) == source_id)
        {
            return Err(CoreError::DuplicateSource(source_id));
        }

        let label = if label.is_empty() { share.to_string() } else { label.to_string() };
        let record = SourceRecord {
            host: host.to_string(),
            share: share.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            subfolder: subfolder.to_string(),
            label,
        };
        decrypted.push(record.clone());
        file.sources = decrypted;
        self.save_file(&file)?;

        let source = record_to_source(record);
        if let Err(e) = backend.register_source(&source.endpoint).await {
            tracing::warn!(source_id = %source.source_id, error = %e, "source saved but SMB registration failed");
        }

        Ok(source)
    }

    /// Removes a source from the config and purges its catalog rows
    /// (cascading to tags/metadata via `ON DELETE CASCADE`), per spec.md
    /// §4.3. Returns the number of rows purged.
    pub fn remove_source(&self, source_id: &str, catalog: &crate::catalog::Catalog) -> Result<i64> {
        let mut file = self.load_file()?;
        let decrypted = self.load_decrypted()?;

        let mut removed_label = None;
        let kept: Vec<SourceRecord> = decrypted
            .into_iter()
            .filter(|r| {
                let sid = Source::id_of(&r.host, &r.share, &r.subfolder);
                if sid == source_id {
                    removed_label = Some(r.label.clone());
                    false
                } else {
                    true
                }
            })
            .collect();

        let Some(label) = removed_label else {
            return Err(CoreError::NotFound(format!("source {source_id}")));
        };

        file.sources = kept;
        self.save_file(&file)?;

        catalog.purge_source(&label)
    }

    pub async fn connection_status(&self, backend: &dyn SmbBackend) -> Result<ConnectionStatus> {
        let sources = self.list_sources()?;
        if sources.is_empty() {
            return Ok(ConnectionStatus {
                configured: false,
                connected: false,
                sources: Vec::new(),
            });
        }

        let mut any_connected = false;
        let mut statuses = Vec::with_capacity(sources.len());
        for source in &sources {
            let connected = backend.test_connection(&source.endpoint).await.is_ok();
            any_connected |= connected;
            statuses.push(SourceStatus {
                source_id: source.source_id.clone(),
                host: source.endpoint.host.clone(),
                share: source.endpoint.share.clone(),
                label: source.endpoint.label.clone(),
                subfolder: source.endpoint.subfolder.clone(),
                connected,
            });
        }

        Ok(ConnectionStatus {
            configured: true,
            connected: any_connected,
            sources: statuses,
        })
    }
}

fn record_to_source(rec: SourceRecord) -> Source {
    let source_id = Source::id_of(&rec.host, &rec.share, &rec.subfolder);
    let label = if rec.label.is_empty() { rec.share.clone() } else { rec.label };
    Source {
        source_id,
        endpoint: SmbEndpoint {
            host: rec.host,
            share: rec.share,
            username: rec.username,
            password: rec.password,
            subfolder: rec.subfolder,
            label,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        registered: Mutex<Vec<String>>,
        connection_ok: bool,
    }

    #[async_trait]
    impl SmbBackend for FakeBackend {
        async fn register_source(&self, endpoint: &SmbEndpoint) -> Result<()> {
            self.registered.lock().unwrap().push(endpoint.host.clone());
            Ok(())
        }
        async fn walk(&self, _endpoint: &SmbEndpoint) -> Result<Vec<crate::smb::WalkEntry>> {
            Ok(Vec::new())
        }
        async fn stat(&self, _smb_path: &str) -> Result<Option<crate::smb::SmbEntry>> {
            Ok(None)
        }
        async fn read_bytes(&self, _smb_path: &str, _max_bytes: u64) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn read_tail(&self, _smb_path: &str, _tail_bytes: u64) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn download_to_temp(&self, _smb_path: &str) -> Result<std::path::PathBuf> {
            Ok(std::path::PathBuf::new())
        }
        fn cleanup_temp(&self, _path: &std::path::Path) {}
        async fn discover_shares(&self, _host: &str, _username: &str, _password: &str) -> Vec<String> {
            Vec::new()
        }
        async fn test_connection(&self, _endpoint: &SmbEndpoint) -> Result<String> {
            if self.connection_ok {
                Ok("ok".to_string())
            } else {
                Err(CoreError::Unreachable("fake".to_string()))
            }
        }
    }

    fn manager(dir: &Path) -> SourceManager {
        SourceManager::open(&dir.join("nas_connection.json"), &dir.join(".encryption_key")).unwrap()
    }

    #[tokio::test]
    async fn add_persists_even_if_registration_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let backend = FakeBackend { connection_ok: false, ..Default::default() };

        let source = mgr
            .add_source(&backend, "nas.local", "media", "u", "p", "/", "Media")
            .await
            .unwrap();
        assert_eq!(source.source_id, "nas.local/media");

        let sources = mgr.list_sources().unwrap();
        assert_eq!(sources.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let backend = FakeBackend::default();
        mgr.add_source(&backend, "nas.local", "media", "u", "p", "/", "Media").await.unwrap();

        let err = mgr
            .add_source(&backend, "nas.local", "media", "u2", "p2", "/", "Media2")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSource(_)));
    }

    #[tokio::test]
    async fn credentials_are_encrypted_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let backend = FakeBackend::default();
        mgr.add_source(&backend, "nas.local", "media", "secretuser", "secretpass", "/", "Media")
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("nas_connection.json")).unwrap();
        assert!(!raw.contains("secretuser"));
        assert!(!raw.contains("secretpass"));

        let sources = mgr.list_sources().unwrap();
        assert_eq!(sources[0].endpoint.username, "secretuser");
        assert_eq!(sources[0].endpoint.password, "secretpass");
    }

    #[test]
    fn remove_purges_catalog_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[crate::catalog::NewFileRow {
                path: crate::types::LogicalPath::new("/Media"),
                name: "Media".into(),
                parent_path: None,
                is_directory: true,
                size: 0,
                mime_type: crate::types::DIRECTORY_MIME.into(),
                created_at: None,
                modified_at: None,
                indexed_at: "2024-01-01T00:00:00Z".into(),
            }])
            .unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let backend = FakeBackend::default();
        rt.block_on(mgr.add_source(&backend, "nas.local", "media", "u", "p", "/", "Media"))
            .unwrap();

        let purged = mgr.remove_source("nas.local/media", &catalog).unwrap();
        assert_eq!(purged, 1);
        assert!(mgr.list_sources().unwrap().is_empty());
    }
}
