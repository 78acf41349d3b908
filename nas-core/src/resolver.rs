//! Path resolver (spec.md §4.8): turns a catalog `LogicalPath` back into
//! the SMB path a collaborator (preview/stream handler, or Phase 2) needs
//! to actually open the file.

use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::smb::relative_to_smb;
use crate::source::SourceManager;
use crate::types::LogicalPath;

pub struct PathResolver {
    sources: Arc<SourceManager>,
}

impl PathResolver {
    pub fn new(sources: Arc<SourceManager>) -> Self {
        Self { sources }
    }

    /// Looks up the source whose label matches `path`'s first component
    /// and re-spells the remainder in SMB form. `ENoSources` if nothing is
    /// configured at all, `ENotFound` if no configured source matches.
    pub fn resolve(&self, path: &LogicalPath) -> Result<String> {
        let sources = self.sources.list_sources()?;
        if sources.is_empty() {
            return Err(CoreError::NoSources);
        }
        sources
            .iter()
            .find_map(|s| relative_to_smb(path, &s.endpoint))
            .ok_or_else(|| CoreError::NotFound(format!("no source matches {path}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_sources_configured_is_distinct_from_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = Arc::new(
            SourceManager::open(&dir.path().join("nas_connection.json"), &dir.path().join(".encryption_key"))
                .unwrap(),
        );
        let resolver = PathResolver::new(mgr);
        let err = resolver.resolve(&LogicalPath::new("/media/a.txt")).unwrap_err();
        assert!(matches!(err, CoreError::NoSources));
    }
}
