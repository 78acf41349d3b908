//! Configuration loading for the NAS catalog indexer: `.toml` file, then
//! environment overrides, then hard-coded defaults — mirroring the
//! `FileConfig` / `EnvConfig` split in the teacher's `ferrex-config` crate.

mod env;
mod error;
mod file;
mod logging;

pub use error::ConfigLoadError;
pub use logging::init_tracing;

use std::path::{Path, PathBuf};

use env::EnvConfig;
use file::FileConfig;

/// Fully resolved runtime configuration. Field names match spec.md §6.
#[derive(Debug, Clone)]
pub struct Config {
    /// Legacy; unused in SMB-only mode. Retained so existing `.env` files
    /// that still set it don't fail to parse.
    pub nas_mount_path: String,
    pub auth_token: String,
    pub database_path: PathBuf,
    pub cache_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub ssl_cert_path: Option<PathBuf>,
    pub ssl_key_path: Option<PathBuf>,
    pub scan_batch_size: usize,
    pub max_text_extract_mb: u64,
    pub max_text_store_kb: u64,
    pub hash_sample_size_kb: u64,
    pub enrichment_workers: usize,
}

/// The bearer token value that disables auth entirely (dev mode).
pub const DEV_MODE_TOKEN: &str = "change-me-to-a-secure-token";

impl Default for Config {
    fn default() -> Self {
        Self {
            nas_mount_path: "/mnt/nas".to_string(),
            auth_token: DEV_MODE_TOKEN.to_string(),
            database_path: PathBuf::from("./data/nas_catalog.db"),
            cache_path: PathBuf::from("./cache/previews"),
            host: "0.0.0.0".to_string(),
            port: 8000,
            ssl_cert_path: None,
            ssl_key_path: None,
            scan_batch_size: 1000,
            max_text_extract_mb: 100,
            max_text_store_kb: 50,
            hash_sample_size_kb: 64,
            enrichment_workers: 4,
        }
    }
}

impl Config {
    /// Load a config file (if present at `path`) layered under environment
    /// variables layered under defaults, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let file = match path {
            Some(p) if p.exists() => FileConfig::load(p)?,
            _ => FileConfig::default(),
        };
        let env = EnvConfig::gather();

        let mut config = Config::default();
        file.apply_to(&mut config);
        env.apply_to(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// The sibling file holding encrypted SMB source credentials, per
    /// spec.md §6 (`nas_connection.json`, next to the catalog database).
    pub fn sources_path(&self) -> PathBuf {
        self.db_sibling("nas_connection.json")
    }

    /// The sibling file holding the raw symmetric encryption key, per
    /// spec.md §6 (`.encryption_key`, `0o600`).
    pub fn encryption_key_path(&self) -> PathBuf {
        self.db_sibling(".encryption_key")
    }

    fn db_sibling(&self, name: &str) -> PathBuf {
        self.database_path
            .parent()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(dir) = self.database_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::create_dir_all(&self.cache_path)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.port == 0 {
            return Err(ConfigLoadError::Invalid("port must be nonzero".into()));
        }
        if self.enrichment_workers == 0 {
            return Err(ConfigLoadError::Invalid(
                "enrichment_workers must be at least 1".into(),
            ));
        }
        if self.scan_batch_size == 0 {
            return Err(ConfigLoadError::Invalid(
                "scan_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_dev_mode(&self) -> bool {
        self.auth_token == DEV_MODE_TOKEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.is_dev_mode());
    }

    #[test]
    fn sibling_paths_sit_next_to_the_database() {
        let mut config = Config::default();
        config.database_path = PathBuf::from("/data/cat.db");
        assert_eq!(
            config.sources_path(),
            PathBuf::from("/data/nas_connection.json")
        );
        assert_eq!(
            config.encryption_key_path(),
            PathBuf::from("/data/.encryption_key")
        );
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = Config::default();
        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_and_env_layer_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            host = "127.0.0.1"
            port = 9001

            [scanner]
            enrichment_workers = 8
            "#,
        )
        .unwrap();

        std::env::set_var("NAS_AUTH_TOKEN", "a-real-token");
        let config = Config::load(Some(&path)).unwrap();
        std::env::remove_var("NAS_AUTH_TOKEN");

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9001);
        assert_eq!(config.enrichment_workers, 8);
        assert_eq!(config.auth_token, "a-real-token");
    }
}
