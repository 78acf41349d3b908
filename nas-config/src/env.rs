use std::path::PathBuf;

use crate::Config;

/// Environment-derived configuration values, gathered once at startup.
/// Mirrors the teacher's `ferrex-config::models::sources::EnvConfig`.
#[derive(Debug, Default)]
pub struct EnvConfig {
    pub nas_mount_path: Option<String>,
    pub auth_token: Option<String>,
    pub database_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl_cert_path: Option<PathBuf>,
    pub ssl_key_path: Option<PathBuf>,
    pub scan_batch_size: Option<usize>,
    pub max_text_extract_mb: Option<u64>,
    pub max_text_store_kb: Option<u64>,
    pub hash_sample_size_kb: Option<u64>,
    pub enrichment_workers: Option<usize>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            nas_mount_path: std::env::var("NAS_MOUNT_PATH").ok(),
            auth_token: std::env::var("NAS_AUTH_TOKEN").ok(),
            database_path: std::env::var("NAS_DATABASE_PATH").ok().map(PathBuf::from),
            cache_path: std::env::var("NAS_CACHE_PATH").ok().map(PathBuf::from),
            host: std::env::var("NAS_HOST").ok(),
            port: std::env::var("NAS_PORT").ok().and_then(|s| s.parse().ok()),
            ssl_cert_path: std::env::var("NAS_SSL_CERT_PATH").ok().map(PathBuf::from),
            ssl_key_path: std::env::var("NAS_SSL_KEY_PATH").ok().map(PathBuf::from),
            scan_batch_size: std::env::var("NAS_SCAN_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_text_extract_mb: std::env::var("NAS_MAX_TEXT_EXTRACT_MB")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_text_store_kb: std::env::var("NAS_MAX_TEXT_STORE_KB")
                .ok()
                .and_then(|s| s.parse().ok()),
            hash_sample_size_kb: std::env::var("NAS_HASH_SAMPLE_SIZE_KB")
                .ok()
                .and_then(|s| s.parse().ok()),
            enrichment_workers: std::env::var("NAS_ENRICHMENT_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
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
        if let Some(v) = self.scan_batch_size {
            config.scan_batch_size = v;
        }
        if let Some(v) = self.max_text_extract_mb {
            config.max_text_extract_mb = v;
        }
        if let Some(v) = self.max_text_store_kb {
            config.max_text_store_kb = v;
        }
        if let Some(v) = self.hash_sample_size_kb {
            config.hash_sample_size_kb = v;
        }
        if let Some(v) = self.enrichment_workers {
            config.enrichment_workers = v;
        }
    }
}
