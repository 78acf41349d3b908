use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Config, ConfigLoadError};

/// Raw configuration as defined in a TOML file. Every field optional so a
/// partial file layers cleanly over defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    pub nas_mount_path: Option<String>,
    pub auth_token: Option<String>,
    pub database_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl_cert_path: Option<PathBuf>,
    pub ssl_key_path: Option<PathBuf>,
    #[serde(default)]
    pub scanner: ScannerFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScannerFileConfig {
    pub scan_batch_size: Option<usize>,
    pub max_text_extract_mb: Option<u64>,
    pub max_text_store_kb: Option<u64>,
    pub hash_sample_size_kb: Option<u64>,
    pub enrichment_workers: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_to(&self, config: &mut Config) {
        if let Some(v) = &self.nas_mount_path {
            config.nas_mount_path = v.clone();
        }
        if let Some(v) = &self.auth_token {
            config.auth_token = v.clone();
        }
        if let Some(v) = &self.database_path {
            config.database_path = v.clone();
        }
        if let Some(v) = &self.cache_path {
            config.cache_path = v.clone();
        }
        if let Some(v) = &self.host {
            config.host = v.clone();
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if self.ssl_cert_path.is_some() {
            config.ssl_cert_path = self.ssl_cert_path.clone();
        }
        if self.ssl_key_path.is_some() {
            config.ssl_key_path = self.ssl_key_path.clone();
        }
        if let Some(v) = self.scanner.scan_batch_size {
            config.scan_batch_size = v;
        }
        if let Some(v) = self.scanner.max_text_extract_mb {
            config.max_text_extract_mb = v;
        }
        if let Some(v) = self.scanner.max_text_store_kb {
            config.max_text_store_kb = v;
        }
        if let Some(v) = self.scanner.hash_sample_size_kb {
            config.hash_sample_size_kb = v;
        }
        if let Some(v) = self.scanner.enrichment_workers {
            config.enrichment_workers = v;
        }
    }
}
