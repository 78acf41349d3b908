//! Tracks temp files created for local-tool access (text/metadata
//! extraction) so they can all be swept on shutdown even if a caller
//! forgets to clean one up (spec.md §4.2, ported from
//! `_temp_files`/`cleanup_all_temps`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Default)]
pub struct TempRegistry {
    dir: PathBuf,
    files: Mutex<HashSet<PathBuf>>,
}

impl TempRegistry {
    pub fn new(dir: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: Mutex::new(HashSet::new()),
        })
    }

    /// Reserves a fresh temp path under the registry's directory,
    /// preserving `name`'s extension if present.
    pub fn reserve(&self, name: &str) -> PathBuf {
        let suffix = name.rsplit_once('.').map(|(_, ext)| format!(".{ext}")).unwrap_or_default();
        let path = self.dir.join(format!("{}{}", uuid::Uuid::new_v4(), suffix));
        self.files.lock().unwrap().insert(path.clone());
        path
    }

    pub fn cleanup(&self, path: &Path) {
        let _ = std::fs::remove_file(path);
        self.files.lock().unwrap().remove(path);
    }

    /// Removes every temp file still tracked, for graceful shutdown.
    pub fn cleanup_all(&self) {
        let mut files = self.files.lock().unwrap();
        for path in files.drain() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TempRegistry::new(dir.path().join("temp")).unwrap();
        let path = registry.reserve("clip.mp4");
        std::fs::write(&path, b"data").unwrap();
        assert!(path.exists());
        registry.cleanup(&path);
        assert!(!path.exists());
    }

    #[test]
    fn cleanup_all_sweeps_every_reservation() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TempRegistry::new(dir.path().join("temp")).unwrap();
        let a = registry.reserve("a.txt");
        let b = registry.reserve("b.txt");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"y").unwrap();
        registry.cleanup_all();
        assert!(!a.exists() && !b.exists());
    }
}
