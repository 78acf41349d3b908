use serde::{Deserialize, Serialize};
use std::fmt;

/// `/<source_label>/<relative>`, the catalog's primary external identifier
/// (spec.md §3). `/<source_label>` alone denotes a source root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Builds the root path for a source label, e.g. `media` -> `/media`.
    pub fn root(label: &str) -> Self {
        Self(format!("/{}", label.trim_matches('/')))
    }

    /// Wraps an already-formed logical path string (leading slash
    /// mandatory, trailing slash stripped).
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if !raw.starts_with('/') {
            raw.insert(0, '/');
        }
        if raw.len() > 1 {
            while raw.ends_with('/') {
                raw.pop();
            }
        }
        Self(raw)
    }

    /// Appends a path segment, e.g. `/media`.join("Movies") -> `/media/Movies`.
    pub fn join(&self, segment: &str) -> Self {
        if segment.is_empty() {
            return self.clone();
        }
        Self(format!("{}/{}", self.0, segment.trim_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first path segment — the owning source's label.
    pub fn source_label(&self) -> Option<&str> {
        self.0
            .strip_prefix('/')
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.split('/').next().unwrap_or(rest))
    }

    /// Everything after `/<label>/`, or empty for a source root.
    pub fn relative(&self) -> &str {
        match self.source_label() {
            Some(label) => self.0.strip_prefix(&format!("/{label}/")).unwrap_or(""),
            None => "",
        }
    }

    /// True for `/<label>` exactly (the source root row).
    pub fn is_root(&self) -> bool {
        self.source_label()
            .is_some_and(|label| self.0 == format!("/{label}"))
    }

    /// True if this path is `/<label>` or begins with `/<label>/` — the
    /// membership test used by source-removal cascades (spec.md §4.3).
    pub fn is_rooted_at(&self, label: &str) -> bool {
        self.0 == format!("/{label}") || self.0.starts_with(&format!("/{label}/"))
    }

    /// The logical path of the parent directory, or `None` for a source
    /// root (whose `parent_path` is the empty string, per spec.md §3).
    pub fn parent(&self) -> Option<LogicalPath> {
        if self.is_root() {
            return None;
        }
        let idx = self.0.rfind('/')?;
        if idx == 0 {
            None
        } else {
            Some(LogicalPath(self.0[..idx].to_string()))
        }
    }

    /// The final path component.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LogicalPath {
    fn from(value: &str) -> Self {
        LogicalPath::new(value)
    }
}

impl From<String> for LogicalPath {
    fn from(value: String) -> Self {
        LogicalPath::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_join() {
        let root = LogicalPath::root("media");
        assert_eq!(root.as_str(), "/media");
        assert!(root.is_root());
        let child = root.join("Movies/Inception.mkv");
        assert_eq!(child.as_str(), "/media/Movies/Inception.mkv");
        assert!(!child.is_root());
    }

    #[test]
    fn source_label_and_relative() {
        let p = LogicalPath::new("/media/Movies/Inception.mkv");
        assert_eq!(p.source_label(), Some("media"));
        assert_eq!(p.relative(), "Movies/Inception.mkv");
    }

    #[test]
    fn rooted_at_matches_root_and_descendants_only() {
        let root = LogicalPath::new("/media");
        let child = LogicalPath::new("/media/file.txt");
        let sibling = LogicalPath::new("/media2/file.txt");
        assert!(root.is_rooted_at("media"));
        assert!(child.is_rooted_at("media"));
        assert!(!sibling.is_rooted_at("media"));
    }

    #[test]
    fn parent_of_nested_path() {
        let p = LogicalPath::new("/media/Movies/Inception.mkv");
        assert_eq!(p.parent().unwrap().as_str(), "/media/Movies");
        assert_eq!(
            LogicalPath::new("/media/Movies").parent().unwrap().as_str(),
            "/media"
        );
        assert!(LogicalPath::new("/media").parent().is_none());
    }

    #[test]
    fn trailing_slash_is_normalized_away() {
        assert_eq!(LogicalPath::new("/media/").as_str(), "/media");
    }
}
