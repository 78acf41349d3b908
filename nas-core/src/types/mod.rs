mod file_row;
mod logical_path;
mod media_metadata;

pub use file_row::{FileRow, MetadataRow, ScanLogRow, ScanStatus, TagRow, TagType, DIRECTORY_MIME};
pub use logical_path::LogicalPath;
pub use media_metadata::MediaMetadata;
