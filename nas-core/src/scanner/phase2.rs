//! Phase 2 — parallel enrichment (spec.md §4.6), ported from
//! `_phase2_enrich`/`_enrich_file`: a bounded worker pool computes a
//! content fingerprint, extracts searchable text, and harvests media
//! metadata for every file row still missing a hash.

use std::sync::Mutex;

use futures_util::{stream, StreamExt};
use serde_json::Value;

use crate::error::Result;
use crate::types::{FileRow, MediaMetadata};

use super::fingerprint::{fingerprint, sample_plan};
use super::{CancelToken, ScanOrchestrator, ScanState};

const METADATA_SIZE_LIMIT_BYTES: i64 = 200 * 1024 * 1024;
const PLAIN_TEXT_SAMPLE_BYTES: u64 = 512 * 1024;
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa", "sub"];
const DOCUMENT_MIMES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

struct EnrichmentResult {
    file_id: i64,
    file_hash: Option<String>,
    full_text: Option<String>,
    metadata: Option<MediaMetadata>,
}

pub(super) async fn run(orchestrator: &ScanOrchestrator, progress: &Mutex<ScanState>, cancel: &CancelToken) -> Result<()> {
    let pending = orchestrator.catalog.files_needing_enrichment()?;
    {
        let mut state = progress.lock().unwrap();
        state.files_to_enrich = pending.len() as i64;
    }
    if pending.is_empty() {
        return Ok(());
    }

    let workers = orchestrator.config.enrichment_workers.max(1);
    let mut results = stream::iter(pending.into_iter().map(|row| enrich_one(orchestrator, row)))
        .buffer_unordered(workers);

    let mut since_commit = 0u32;
    while let Some(outcome) = results.next().await {
        if cancel.is_cancelled() {
            break;
        }
        match outcome {
            Ok(Some(result)) => {
                if let Err(e) = orchestrator.catalog.apply_enrichment(
                    result.file_id,
                    result.file_hash.as_deref(),
                    result.full_text.as_deref(),
                ) {
                    progress.lock().unwrap().record_error(format!("enrichment write failed: {e}"));
                    continue;
                }
                if let Some(metadata) = &result.metadata {
                    if let Err(e) = orchestrator.catalog.upsert_metadata(result.file_id, metadata) {
                        progress.lock().unwrap().record_error(format!("metadata write failed: {e}"));
                    }
                }
                progress.lock().unwrap().files_enriched += 1;
                since_commit += 1;
                if since_commit >= 50 {
                    since_commit = 0;
                }
            }
            Ok(None) => {}
            Err(e) => {
                progress.lock().unwrap().record_error(e.to_string());
            }
        }
    }

    Ok(())
}

/// Enriches one row. Bounded to 120s (spec.md §5) so a single hung SMB
/// read can't stall the whole pool indefinitely.
async fn enrich_one(orchestrator: &ScanOrchestrator, row: FileRow) -> Result<Option<EnrichmentResult>> {
    let timeout = std::time::Duration::from_secs(120);
    match tokio::time::timeout(timeout, enrich_inner(orchestrator, &row)).await {
        Ok(result) => Ok(result),
        Err(_) => Ok(None),
    }
}

async fn enrich_inner(orchestrator: &ScanOrchestrator, row: &FileRow) -> Option<EnrichmentResult> {
    let smb_path = orchestrator.resolver.resolve(&row.path).ok()?;
    let mime = row.mime_type.clone();

    let file_hash = compute_fingerprint(orchestrator, &smb_path, row.size, orchestrator.config.hash_sample_size_kb)
        .await
        .ok()
        .flatten();

    let full_text = if row.size <= orchestrator.config.max_text_extract_mb as i64 * 1024 * 1024 {
        extract_text(orchestrator, &smb_path, &mime, orchestrator.config.max_text_store_kb).await
    } else {
        None
    };

    let metadata = if is_media_mime(&mime) && row.size <= METADATA_SIZE_LIMIT_BYTES {
        extract_metadata(orchestrator, &smb_path, &mime).await
    } else {
        None
    };

    if file_hash.is_none() && full_text.is_none() && metadata.is_none() {
        return None;
    }

    Some(EnrichmentResult { file_id: row.id, file_hash, full_text, metadata })
}

async fn compute_fingerprint(
    orchestrator: &ScanOrchestrator,
    smb_path: &str,
    size: i64,
    sample_kib: u64,
) -> Result<Option<String>> {
    let (head_len, tail_len) = sample_plan(size, sample_kib);
    let head = orchestrator.backend.read_bytes(smb_path, head_len).await?;
    let tail = if tail_len > 0 {
        orchestrator.backend.read_tail(smb_path, tail_len).await?
    } else {
        Vec::new()
    };
    Ok(Some(fingerprint(size, &head, &tail)))
}

fn is_plainish_mime(mime: &str) -> bool {
    mime.starts_with("text/")
        || matches!(
            mime,
            "application/json" | "application/xml" | "application/javascript" | "application/x-yaml" | "application/x-python"
        )
}

fn is_media_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("video/") || mime.starts_with("audio/")
}

fn subtitle_extension(smb_path: &str) -> bool {
    smb_path
        .rsplit(['\\', '/'])
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| SUBTITLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

async fn extract_text(
    orchestrator: &ScanOrchestrator,
    smb_path: &str,
    mime: &str,
    max_store_kb: u64,
) -> Option<String> {
    let text = if is_plainish_mime(mime) {
        let bytes = orchestrator.backend.read_bytes(smb_path, PLAIN_TEXT_SAMPLE_BYTES).await.ok()?;
        String::from_utf8_lossy(&bytes).into_owned()
    } else if DOCUMENT_MIMES.contains(&mime) || subtitle_extension(smb_path) {
        let local_path = orchestrator.backend.download_to_temp(smb_path).await.ok()?;
        let extracted = orchestrator.text_extractor.extract_text(&local_path, mime).await;
        orchestrator.backend.cleanup_temp(&local_path);
        extracted?
    } else {
        return None;
    };

    let limit = (max_store_kb * 1024) as usize;
    Some(if text.len() > limit { text[..limit].to_string() } else { text })
}

async fn extract_metadata(orchestrator: &ScanOrchestrator, smb_path: &str, mime: &str) -> Option<MediaMetadata> {
    let local_path = orchestrator.backend.download_to_temp(smb_path).await.ok()?;
    let value = orchestrator.metadata_extractor.extract_metadata(&local_path, mime).await;
    orchestrator.backend.cleanup_temp(&local_path);
    metadata_from_value(mime, value?)
}

/// Maps the extractor's generic `map<string,scalar|map>` into the tagged
/// `MediaMetadata` variant for `mime`'s class. Unknown or mistyped fields
/// are dropped rather than failing the whole enrichment.
fn metadata_from_value(mime: &str, value: Value) -> Option<MediaMetadata> {
    let get_u32 = |key: &str| value.get(key).and_then(Value::as_u64).map(|v| v as u32);
    let get_u64 = |key: &str| value.get(key).and_then(Value::as_u64);
    let get_f64 = |key: &str| value.get(key).and_then(Value::as_f64);
    let get_str = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let get_str_map = |key: &str| -> std::collections::BTreeMap<String, String> {
        value
            .get(key)
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    };

    if mime.starts_with("image/") {
        Some(MediaMetadata::Image {
            width: get_u32("width"),
            height: get_u32("height"),
            color_mode: get_str("color_mode"),
            format: get_str("format"),
            exif: get_str_map("exif"),
        })
    } else if mime.starts_with("video/") {
        Some(MediaMetadata::Video {
            duration_secs: get_f64("duration_secs"),
            bitrate: get_u64("bitrate"),
            codec: get_str("codec"),
            width: get_u32("width"),
            height: get_u32("height"),
        })
    } else if mime.starts_with("audio/") {
        Some(MediaMetadata::Audio {
            duration_secs: get_f64("duration_secs"),
            bitrate: get_u64("bitrate"),
            channels: get_u32("channels"),
            tags: get_str_map("tags"),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plainish_mime_detection() {
        assert!(is_plainish_mime("text/plain"));
        assert!(is_plainish_mime("application/json"));
        assert!(!is_plainish_mime("application/pdf"));
    }

    #[test]
    fn subtitle_detection_is_case_insensitive() {
        assert!(subtitle_extension(r"\\nas\media\movie.SRT"));
        assert!(!subtitle_extension(r"\\nas\media\movie.mkv"));
    }

    #[test]
    fn metadata_from_value_picks_class_by_mime() {
        let value = serde_json::json!({"width": 1920, "height": 1080, "format": "jpeg"});
        let meta = metadata_from_value("image/jpeg", value).unwrap();
        assert_eq!(meta.kind(), "image");
    }
}
