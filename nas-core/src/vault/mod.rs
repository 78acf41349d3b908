//! Symmetric encryption for stored SMB credentials (spec.md §4.1).
//!
//! Key handling mirrors the teacher's device-key wrapping in
//! `ferrex-player::domains::auth::storage`: a random key generated on first
//! use, written next to the catalog database with owner-only permissions,
//! reloaded on subsequent starts.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;

use crate::error::{CoreError, Result};

const ENCRYPTED_PREFIX: &str = "enc:";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Encrypts/decrypts SMB credential fields before they touch disk.
///
/// Empty values pass through unchanged; plaintext legacy values (no `enc:`
/// prefix) are recognized by `is_encrypted` and transparently readable by
/// `decrypt`, so callers can auto-migrate them on next write.
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Loads the key file at `key_path`, generating and persisting a fresh
    /// one (mode `0o600`) if it doesn't exist yet.
    pub fn open(key_path: &Path) -> Result<Self> {
        let key_bytes = load_or_create_key(key_path)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        Ok(Self { cipher })
    }

    /// Encrypts `plaintext`, returning an `enc:`-prefixed, base64-encoded
    /// `nonce || ciphertext`. A fresh random nonce is drawn every call, so
    /// encrypting the same plaintext twice yields distinct ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return plaintext.to_string();
        }
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("AES-256-GCM encryption of a bounded plaintext cannot fail");

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        format!("{ENCRYPTED_PREFIX}{}", BASE64.encode(combined))
    }

    /// Decrypts a value produced by `encrypt`. A value without the `enc:`
    /// prefix is treated as an unmigrated plaintext legacy value and
    /// returned as-is. Any other failure (bad base64, truncated payload,
    /// AEAD tag mismatch — all symptomatic of a lost or rotated key) is
    /// reported as `CoreError::KeyLost`.
    pub fn decrypt(&self, value: &str) -> Result<String> {
        if value.is_empty() || !Self::is_encrypted(value) {
            return Ok(value.to_string());
        }

        let raw = BASE64
            .decode(&value[ENCRYPTED_PREFIX.len()..])
            .map_err(|_| CoreError::KeyLost)?;
        if raw.len() < NONCE_LEN {
            return Err(CoreError::KeyLost);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CoreError::KeyLost)?;
        String::from_utf8(plaintext).map_err(|_| CoreError::KeyLost)
    }

    pub fn is_encrypted(value: &str) -> bool {
        !value.is_empty() && value.starts_with(ENCRYPTED_PREFIX)
    }
}

fn load_or_create_key(path: &Path) -> Result<[u8; KEY_LEN]> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        if bytes.len() != KEY_LEN {
            return Err(CoreError::KeyLost);
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        return Ok(key);
    }

    let mut key = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    write_key_file(path, &key)?;
    tracing::info!(path = %path.display(), "generated new encryption key");
    Ok(key)
}

fn write_key_file(path: &Path, key: &[u8; KEY_LEN]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(key)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Default path for the key file sibling to the catalog database
/// (spec.md §6: `.encryption_key`).
pub fn default_key_path(database_path: &Path) -> PathBuf {
    database_path
        .parent()
        .map(|dir| dir.join(".encryption_key"))
        .unwrap_or_else(|| PathBuf::from(".encryption_key"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_utf8_strings() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::open(&dir.path().join(".encryption_key")).unwrap();

        let plaintext = "pässwörd_123";
        let ciphertext = vault.encrypt(plaintext);
        assert!(CredentialVault::is_encrypted(&ciphertext));
        assert_eq!(vault.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn nonce_is_fresh_each_call() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::open(&dir.path().join(".encryption_key")).unwrap();

        let a = vault.encrypt("hunter2");
        let b = vault.encrypt("hunter2");
        assert_ne!(a, b);
        assert_eq!(vault.decrypt(&a).unwrap(), "hunter2");
        assert_eq!(vault.decrypt(&b).unwrap(), "hunter2");
    }

    #[test]
    fn empty_and_plaintext_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let vault = CredentialVault::open(&dir.path().join(".encryption_key")).unwrap();

        assert_eq!(vault.encrypt(""), "");
        assert_eq!(vault.decrypt("").unwrap(), "");
        assert!(!CredentialVault::is_encrypted(""));

        assert_eq!(vault.decrypt("plain-legacy-password").unwrap(), "plain-legacy-password");
        assert!(!CredentialVault::is_encrypted("plain-legacy-password"));
    }

    #[test]
    fn key_reloads_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join(".encryption_key");

        let vault1 = CredentialVault::open(&key_path).unwrap();
        let ciphertext = vault1.encrypt("reload-me");

        let vault2 = CredentialVault::open(&key_path).unwrap();
        assert_eq!(vault2.decrypt(&ciphertext).unwrap(), "reload-me");
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join(".encryption_key");
        CredentialVault::open(&key_path).unwrap();

        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
