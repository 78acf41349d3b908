//! Trait surfaces for the collaborators the catalog core treats as external:
//! format-specific content extraction and bearer-token authentication.
//!
//! The core never depends on a concrete PDF/DOCX/ffprobe/EXIF implementation
//! or a concrete auth backend — it depends on these traits, the way the
//! teacher's `ferrex-contracts` crate sits between `ferrex-model` and the
//! services that consume it.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

/// Extracts searchable plain text from a local file.
///
/// Implementations cover PDF/DOCX/XLSX/plaintext/subtitle formats. The core
/// only ever calls this with a local path produced by its own
/// `downloadToTemp`, never a network path.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Returns `None` when the format has no extractable text or the
    /// extractor doesn't recognize `mime`.
    async fn extract_text(&self, local_path: &Path, mime: &str) -> Option<String>;
}

/// Extracts media metadata (dimensions, duration, codec, tags, EXIF, ...)
/// from a local file.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Returns `None` when `mime` isn't a supported media class.
    async fn extract_metadata(&self, local_path: &Path, mime: &str) -> Option<Value>;
}

/// Outcome of an auth check against an inbound request's bearer token (or
/// its query-param fallback, used by preview URLs embedded in `<img>` tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Ok,
    Reject,
}

/// Bearer-token validation, with a documented dev-mode bypass: a request is
/// accepted unconditionally when the configured token still equals the
/// well-known default `change-me-to-a-secure-token`. Implementations should
/// additionally accept `?token=<token>` as a fallback to the `Authorization`
/// header for preview URLs that can't set custom headers.
pub trait AuthGuard: Send + Sync {
    fn check(&self, bearer_token: Option<&str>, query_token: Option<&str>) -> AuthOutcome;
}
