use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::types::MediaMetadata;

use super::Catalog;

impl Catalog {
    /// Upserts the media metadata blob for a file (spec.md §4.6 step 2).
    pub fn upsert_metadata(&self, file_id: i64, metadata: &MediaMetadata) -> Result<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(metadata)?;
        conn.execute(
            "INSERT OR REPLACE INTO file_metadata (file_id, metadata) VALUES (?1, ?2)",
            params![file_id, json],
        )?;
        Ok(())
    }

    pub fn metadata_for_file(&self, file_id: i64) -> Result<Option<MediaMetadata>> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT metadata FROM file_metadata WHERE file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match json {
            Some(j) => Some(serde_json::from_str(&j)?),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::files::NewFileRow;
    use crate::types::LogicalPath;

    #[test]
    fn upsert_and_read_back() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[NewFileRow {
                path: LogicalPath::new("/media/photo.jpg"),
                name: "photo.jpg".into(),
                parent_path: Some("/media".into()),
                is_directory: false,
                size: 2048,
                mime_type: "image/jpeg".into(),
                created_at: None,
                modified_at: None,
                indexed_at: "2024-01-01T00:00:00Z".into(),
            }])
            .unwrap();
        let file = catalog
            .get_by_path(&LogicalPath::new("/media/photo.jpg"))
            .unwrap()
            .unwrap();

        let meta = MediaMetadata::Image {
            width: Some(1920),
            height: Some(1080),
            color_mode: Some("RGB".into()),
            format: Some("JPEG".into()),
            exif: Default::default(),
        };
        catalog.upsert_metadata(file.id, &meta).unwrap();

        let read_back = catalog.metadata_for_file(file.id).unwrap().unwrap();
        assert_eq!(read_back, meta);
    }
}
