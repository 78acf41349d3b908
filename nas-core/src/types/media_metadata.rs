use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Media-kind-specific metadata, stored as the `file_metadata.metadata` JSON
/// column. Replaces the original dynamic-map design (spec.md §9 Design
/// Note) with a tagged variant per media class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaMetadata {
    Image {
        width: Option<u32>,
        height: Option<u32>,
        color_mode: Option<String>,
        format: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        exif: BTreeMap<String, String>,
    },
    Video {
        duration_secs: Option<f64>,
        bitrate: Option<u64>,
        codec: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
    Audio {
        duration_secs: Option<f64>,
        bitrate: Option<u64>,
        channels: Option<u32>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        tags: BTreeMap<String, String>,
    },
}

impl MediaMetadata {
    /// Which media class this belongs to, for MIME-driven dispatch.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaMetadata::Image { .. } => "image",
            MediaMetadata::Video { .. } => "video",
            MediaMetadata::Audio { .. } => "audio",
        }
    }
}
