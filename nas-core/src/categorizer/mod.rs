//! Deterministic rule-based tagging (spec.md §4.5).
//!
//! `categorize` is pure: the same `(name, mime, size, modified_at)` always
//! produces the same tag set, so re-running it is idempotent and safe to
//! call on every scan without tracking what was applied before.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

const SIZE_LARGE_GB: i64 = 1;
const SIZE_HUGE_GB: i64 = 10;
const GIB: i64 = 1024 * 1024 * 1024;
const OLD_THRESHOLD_DAYS: i64 = 365 * 3;

/// Extension (including the leading dot, lowercase) to its base tag set.
static EXTENSION_CATEGORIES: Lazy<BTreeMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        BTreeMap::from([
            // Video
            (".mp4", &["media", "video"][..]),
            (".mkv", &["media", "video"][..]),
            (".avi", &["media", "video"][..]),
            (".mov", &["media", "video"][..]),
            (".wmv", &["media", "video"][..]),
            (".flv", &["media", "video"][..]),
            (".webm", &["media", "video"][..]),
            (".m4v", &["media", "video"][..]),
            (".ts", &["media", "video"][..]),
            (".mpg", &["media", "video"][..]),
            (".mpeg", &["media", "video"][..]),
            // Audio
            (".mp3", &["media", "audio", "music"][..]),
            (".flac", &["media", "audio", "music"][..]),
            (".wav", &["media", "audio"][..]),
            (".aac", &["media", "audio", "music"][..]),
            (".ogg", &["media", "audio"][..]),
            (".wma", &["media", "audio"][..]),
            (".m4a", &["media", "audio", "music"][..]),
            (".opus", &["media", "audio"][..]),
            (".aiff", &["media", "audio"][..]),
            // Images
            (".jpg", &["media", "image", "photo"][..]),
            (".jpeg", &["media", "image", "photo"][..]),
            (".png", &["media", "image"][..]),
            (".gif", &["media", "image"][..]),
            (".bmp", &["media", "image"][..]),
            (".tiff", &["media", "image"][..]),
            (".tif", &["media", "image"][..]),
            (".webp", &["media", "image"][..]),
            (".svg", &["media", "image", "vector"][..]),
            (".raw", &["media", "image", "photo"][..]),
            (".cr2", &["media", "image", "photo"][..]),
            (".nef", &["media", "image", "photo"][..]),
            (".arw", &["media", "image", "photo"][..]),
            (".heic", &["media", "image", "photo"][..]),
            (".heif", &["media", "image", "photo"][..]),
            // Documents
            (".pdf", &["document"][..]),
            (".doc", &["document"][..]),
            (".docx", &["document"][..]),
            (".odt", &["document"][..]),
            (".rtf", &["document"][..]),
            (".txt", &["document", "text"][..]),
            (".md", &["document", "text"][..]),
            (".tex", &["document"][..]),
            (".epub", &["document", "ebook"][..]),
            // Spreadsheets
            (".xlsx", &["document", "spreadsheet"][..]),
            (".xls", &["document", "spreadsheet"][..]),
            (".csv", &["document", "data"][..]),
            (".tsv", &["document", "data"][..]),
            (".ods", &["document", "spreadsheet"][..]),
            // Presentations
            (".pptx", &["document", "presentation"][..]),
            (".ppt", &["document", "presentation"][..]),
            (".odp", &["document", "presentation"][..]),
            (".key", &["document", "presentation"][..]),
            // Code
            (".py", &["code", "python"][..]),
            (".js", &["code", "javascript"][..]),
            (".ts", &["code", "typescript"][..]),
            (".jsx", &["code", "javascript"][..]),
            (".tsx", &["code", "typescript"][..]),
            (".html", &["code", "web"][..]),
            (".css", &["code", "web"][..]),
            (".java", &["code", "java"][..]),
            (".cpp", &["code", "cpp"][..]),
            (".c", &["code", "c"][..]),
            (".h", &["code", "c"][..]),
            (".go", &["code", "go"][..]),
            (".rs", &["code", "rust"][..]),
            (".rb", &["code", "ruby"][..]),
            (".php", &["code", "php"][..]),
            (".swift", &["code", "swift"][..]),
            (".kt", &["code", "kotlin"][..]),
            (".sh", &["code", "shell"][..]),
            (".bash", &["code", "shell"][..]),
            (".sql", &["code", "database"][..]),
            (".r", &["code", "r"][..]),
            (".m", &["code", "matlab"][..]),
            // Archives
            (".zip", &["archive"][..]),
            (".tar", &["archive"][..]),
            (".gz", &["archive"][..]),
            (".bz2", &["archive"][..]),
            (".xz", &["archive"][..]),
            (".7z", &["archive"][..]),
            (".rar", &["archive"][..]),
            (".iso", &["archive", "disk-image"][..]),
            (".dmg", &["archive", "disk-image"][..]),
            // Data
            (".json", &["data"][..]),
            (".xml", &["data"][..]),
            (".yaml", &["data"][..]),
            (".yml", &["data"][..]),
            (".toml", &["data"][..]),
            (".ini", &["data", "config"][..]),
            (".cfg", &["data", "config"][..]),
            (".conf", &["data", "config"][..]),
            (".db", &["data", "database"][..]),
            (".sqlite", &["data", "database"][..]),
            (".sqlite3", &["data", "database"][..]),
            // Fonts
            (".ttf", &["font"][..]),
            (".otf", &["font"][..]),
            (".woff", &["font"][..]),
            (".woff2", &["font"][..]),
            // Subtitles
            (".srt", &["subtitle"][..]),
            (".vtt", &["subtitle"][..]),
            (".ass", &["subtitle"][..]),
            (".ssa", &["subtitle"][..]),
            (".sub", &["subtitle"][..]),
            // 3D / Design
            (".psd", &["design", "photoshop"][..]),
            (".ai", &["design", "illustrator"][..]),
            (".sketch", &["design"][..]),
            (".fig", &["design"][..]),
            (".blend", &["3d"][..]),
            (".obj", &["3d"][..]),
            (".fbx", &["3d"][..]),
            (".stl", &["3d"][..]),
            // Executables / System
            (".exe", &["executable"][..]),
            (".msi", &["executable", "installer"][..]),
            (".deb", &["executable", "installer"][..]),
            (".rpm", &["executable", "installer"][..]),
            (".apk", &["executable", "mobile"][..]),
            (".app", &["executable"][..]),
            (".dll", &["system"][..]),
            (".so", &["system"][..]),
            (".dylib", &["system"][..]),
        ])
    });

/// Applies every rule to a single file and returns its tags in sorted
/// order. Pure and deterministic: re-running this on the same inputs is a
/// no-op from the caller's perspective.
pub fn categorize(
    name: &str,
    mime_type: Option<&str>,
    size: i64,
    modified_at: Option<DateTime<Utc>>,
) -> Vec<String> {
    let mut tags: BTreeSet<String> = BTreeSet::new();

    if let Some(ext) = extension_of(name) {
        if let Some(base) = EXTENSION_CATEGORIES.get(ext.as_str()) {
            tags.extend(base.iter().map(|s| s.to_string()));
        }
    }

    if let Some(mime) = mime_type {
        if mime.starts_with("video/") {
            tags.insert("media".into());
            tags.insert("video".into());
        } else if mime.starts_with("audio/") {
            tags.insert("media".into());
            tags.insert("audio".into());
        } else if mime.starts_with("image/") {
            tags.insert("media".into());
            tags.insert("image".into());
        } else if mime.starts_with("text/") {
            tags.insert("text".into());
        } else if mime == "application/pdf" {
            tags.insert("document".into());
        }
    }

    if size >= SIZE_HUGE_GB * GIB {
        tags.insert("huge".into());
        tags.insert("large".into());
    } else if size >= SIZE_LARGE_GB * GIB {
        tags.insert("large".into());
    } else if size == 0 {
        tags.insert("empty".into());
    }

    if let Some(mtime) = modified_at {
        let age_days = (Utc::now() - mtime).num_days();
        if age_days > OLD_THRESHOLD_DAYS {
            tags.insert("old".into());
        }
    }

    let name_lower = name.to_lowercase();
    if name_lower.starts_with('.') {
        tags.insert("hidden".into());
    }
    if ["backup", "bak", "old", "copy"]
        .iter()
        .any(|kw| name_lower.contains(kw))
    {
        tags.insert("backup".into());
    }
    if ["temp", "tmp", "cache"]
        .iter()
        .any(|kw| name_lower.contains(kw))
    {
        tags.insert("temporary".into());
    }
    if ["readme", "changelog", "license", "contributing"]
        .iter()
        .any(|kw| name_lower.contains(kw))
    {
        tags.insert("documentation".into());
    }
    if ["screenshot", "screen shot", "capture"]
        .iter()
        .any(|kw| name_lower.contains(kw))
    {
        tags.insert("screenshot".into());
    }

    tags.into_iter().collect()
}

fn extension_of(name: &str) -> Option<String> {
    let dot = name.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(name[dot..].to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn extension_rule_applies() {
        let tags = categorize("movie.mp4", None, 1024, None);
        assert_eq!(tags, vec!["media".to_string(), "video".to_string()]);
    }

    #[test]
    fn mime_fallback_when_extension_unknown() {
        let tags = categorize("blob.xyz", Some("image/png"), 1024, None);
        assert!(tags.contains(&"image".to_string()));
        assert!(tags.contains(&"media".to_string()));
    }

    #[test]
    fn size_thresholds() {
        assert!(categorize("f", None, 0, None).contains(&"empty".to_string()));
        assert!(categorize("f", None, 2 * GIB, None).contains(&"large".to_string()));
        let huge = categorize("f", None, 11 * GIB, None);
        assert!(huge.contains(&"huge".to_string()));
        assert!(huge.contains(&"large".to_string()));
    }

    #[test]
    fn old_tag_requires_mtime_past_threshold() {
        let recent = Utc::now() - Duration::days(10);
        let ancient = Utc::now() - Duration::days(365 * 4);
        assert!(!categorize("f.txt", None, 10, Some(recent)).contains(&"old".to_string()));
        assert!(categorize("f.txt", None, 10, Some(ancient)).contains(&"old".to_string()));
    }

    #[test]
    fn name_heuristics() {
        assert!(categorize(".hidden", None, 10, None).contains(&"hidden".to_string()));
        assert!(categorize("report_backup.docx", None, 10, None).contains(&"backup".to_string()));
        assert!(categorize("tmp_cache.bin", None, 10, None).contains(&"temporary".to_string()));
        assert!(categorize("README.md", None, 10, None).contains(&"documentation".to_string()));
        assert!(categorize("Screenshot 2024.png", None, 10, None).contains(&"screenshot".to_string()));
    }

    #[test]
    fn is_deterministic_and_idempotent() {
        let a = categorize("video.mkv", Some("video/x-matroska"), 5 * GIB, None);
        let b = categorize("video.mkv", Some("video/x-matroska"), 5 * GIB, None);
        assert_eq!(a, b);
    }
}
