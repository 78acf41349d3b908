//! Translation between SMB (`\`-separated) paths and catalog logical
//! paths (`/`-separated), and extension-based MIME guessing
//! (spec.md §3, §4.2, ported from `smb_to_relative`/`relative_to_smb`/
//! `get_mime_type`).

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::types::{LogicalPath, DIRECTORY_MIME};

use super::SmbEndpoint;

/// Converts an absolute SMB path under `endpoint`'s root into the
/// catalog's logical path (`/<label>/<relative>`), falling back to just
/// the trailing path component if `smb_path` isn't actually under the
/// endpoint's root.
pub fn smb_to_relative(smb_path: &str, endpoint: &SmbEndpoint) -> LogicalPath {
    let root = endpoint.smb_root();
    let norm_path = smb_path.replace('/', "\\").trim_end_matches('\\').to_string();
    let norm_root = root.replace('/', "\\");

    if norm_path == norm_root {
        return LogicalPath::root(&endpoint.label);
    }

    let prefix = format!("{norm_root}\\");
    if let Some(rel) = norm_path.strip_prefix(&prefix) {
        return LogicalPath::root(&endpoint.label).join(&rel.replace('\\', "/"));
    }

    let name = smb_path.replace('\\', "/");
    let name = name.rsplit('/').next().unwrap_or(&name);
    LogicalPath::new(format!("/{name}"))
}

/// Reconstructs an SMB path from a logical path, given the endpoint whose
/// label matches the path's first segment. Returns `None` if the
/// endpoint's label doesn't match.
pub fn relative_to_smb(path: &LogicalPath, endpoint: &SmbEndpoint) -> Option<String> {
    if path.source_label()? != endpoint.label {
        return None;
    }
    let rel = path.relative();
    if rel.is_empty() {
        Some(endpoint.smb_root())
    } else {
        Some(format!("{}\\{}", endpoint.smb_root(), rel.replace('/', "\\")))
    }
}

static EXTENSION_MIME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("txt", "text/plain"),
        ("md", "text/markdown"),
        ("csv", "text/csv"),
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("json", "application/json"),
        ("xml", "application/xml"),
        ("yaml", "application/x-yaml"),
        ("yml", "application/x-yaml"),
        ("js", "application/javascript"),
        ("py", "application/x-python"),
        ("pdf", "application/pdf"),
        ("doc", "application/msword"),
        ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        ("xls", "application/vnd.ms-excel"),
        ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        ("ppt", "application/vnd.ms-powerpoint"),
        ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
        ("zip", "application/zip"),
        ("tar", "application/x-tar"),
        ("gz", "application/gzip"),
        ("7z", "application/x-7z-compressed"),
        ("rar", "application/vnd.rar"),
        ("mp4", "video/mp4"),
        ("mkv", "video/x-matroska"),
        ("avi", "video/x-msvideo"),
        ("mov", "video/quicktime"),
        ("webm", "video/webm"),
        ("mp3", "audio/mpeg"),
        ("flac", "audio/flac"),
        ("wav", "audio/wav"),
        ("ogg", "audio/ogg"),
        ("m4a", "audio/mp4"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("webp", "image/webp"),
        ("svg", "image/svg+xml"),
        ("tiff", "image/tiff"),
        ("tif", "image/tiff"),
        ("srt", "application/x-subrip"),
        ("vtt", "text/vtt"),
    ])
});

/// Guesses a file's MIME type by extension alone — fast, no download
/// required (spec.md §4.6 step 1 keeps Phase 1 extension-only).
pub fn guess_mime(name: &str) -> String {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => return "application/octet-stream".to_string(),
    };
    EXTENSION_MIME
        .get(ext.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

pub fn mime_for_entry(name: &str, is_directory: bool) -> String {
    if is_directory {
        DIRECTORY_MIME.to_string()
    } else {
        guess_mime(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> SmbEndpoint {
        SmbEndpoint {
            host: "nas.local".into(),
            share: "media".into(),
            username: "u".into(),
            password: "p".into(),
            subfolder: String::new(),
            label: "media".into(),
        }
    }

    #[test]
    fn root_maps_to_label_root() {
        let ep = endpoint();
        let p = smb_to_relative(r"\\nas.local\media", &ep);
        assert_eq!(p.as_str(), "/media");
    }

    #[test]
    fn nested_path_maps_to_relative() {
        let ep = endpoint();
        let p = smb_to_relative(r"\\nas.local\media\Movies\Inception.mkv", &ep);
        assert_eq!(p.as_str(), "/media/Movies/Inception.mkv");
    }

    #[test]
    fn relative_to_smb_round_trips() {
        let ep = endpoint();
        let logical = LogicalPath::new("/media/Movies/Inception.mkv");
        assert_eq!(
            relative_to_smb(&logical, &ep).unwrap(),
            r"\\nas.local\media\Movies\Inception.mkv"
        );
    }

    #[test]
    fn relative_to_smb_rejects_other_labels() {
        let ep = endpoint();
        let logical = LogicalPath::new("/other/file.txt");
        assert!(relative_to_smb(&logical, &ep).is_none());
    }

    #[test]
    fn mime_guess_by_extension() {
        assert_eq!(guess_mime("movie.MP4"), "video/mp4");
        assert_eq!(guess_mime("noext"), "application/octet-stream");
        assert_eq!(mime_for_entry("dir", true), DIRECTORY_MIME);
    }
}
