//! Placeholder `TextExtractor`/`MetadataExtractor` implementations.
//!
//! spec.md §1 names the format-specific extractors (PDF/DOCX/XLSX/EXIF/
//! ffprobe/audio tags) as external collaborators reached only through
//! `extractText`/`extractMetadata`; building them is out of scope here.
//! These no-op stand-ins satisfy the trait surface so the server can run
//! end to end — a deployment wires in real extractors by swapping these
//! two types in `main.rs`.

use std::path::Path;

use async_trait::async_trait;
use nas_contracts::{MetadataExtractor, TextExtractor};
use serde_json::Value;

pub struct NullTextExtractor;

#[async_trait]
impl TextExtractor for NullTextExtractor {
    async fn extract_text(&self, _local_path: &Path, _mime: &str) -> Option<String> {
        None
    }
}

pub struct NullMetadataExtractor;

#[async_trait]
impl MetadataExtractor for NullMetadataExtractor {
    async fn extract_metadata(&self, _local_path: &Path, _mime: &str) -> Option<Value> {
        None
    }
}
