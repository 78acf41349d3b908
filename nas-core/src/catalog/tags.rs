use rusqlite::params;

use crate::categorizer;
use crate::error::Result;
use crate::types::{FileRow, TagRow, TagType};

use super::Catalog;

impl Catalog {
    /// Runs the categorizer over every file under `source_label` and
    /// inserts the resulting tags, ignoring ones already present
    /// (spec.md §4.6 step 1's bulk tagging pass, ported from the original
    /// scanner's `_apply_tags_bulk`).
    pub fn apply_rule_tags(&self, source_label: &str) -> Result<()> {
        let conn = self.conn()?;
        let like = format!("/{source_label}/%");
        let mut stmt = conn.prepare(
            "SELECT id, name, mime_type, size, modified_at FROM files
             WHERE path LIKE ?1 AND is_directory = 0",
        )?;
        let rows: Vec<(i64, String, Option<String>, i64, Option<String>)> = stmt
            .query_map(params![like], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        for (file_id, name, mime, size, modified_at) in rows {
            let mtime = modified_at
                .and_then(|v| chrono::DateTime::parse_from_rfc3339(&v).ok())
                .map(|v| v.with_timezone(&chrono::Utc));
            let tags = categorizer::categorize(&name, mime.as_deref(), size, mtime);
            for tag in tags {
                conn.execute(
                    "INSERT OR IGNORE INTO file_tags (file_id, tag, tag_type) VALUES (?1, ?2, 'rule')",
                    params![file_id, tag],
                )?;
            }
        }
        Ok(())
    }

    /// Adds a single user-supplied tag, distinguished from rule-derived
    /// tags so a future re-tagging pass never clobbers it.
    pub fn add_user_tag(&self, file_id: i64, tag: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO file_tags (file_id, tag, tag_type) VALUES (?1, ?2, 'user')",
            params![file_id, tag],
        )?;
        Ok(())
    }

    pub fn remove_tag(&self, file_id: i64, tag: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM file_tags WHERE file_id = ?1 AND tag = ?2",
            params![file_id, tag],
        )?;
        Ok(())
    }

    pub fn tags_for_file(&self, file_id: i64) -> Result<Vec<TagRow>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT file_id, tag, tag_type FROM file_tags WHERE file_id = ?1")?;
        let rows = stmt
            .query_map(params![file_id], map_tag_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Files carrying a given tag, newest-indexed first.
    pub fn files_by_tag(&self, tag: &str) -> Result<Vec<FileRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT f.id, f.path, f.name, f.parent_path, f.is_directory, f.size, f.mime_type,
                    f.file_hash, f.created_at, f.modified_at, f.indexed_at, f.full_text
             FROM files f JOIN file_tags t ON t.file_id = f.id
             WHERE t.tag = ?1 ORDER BY f.indexed_at DESC",
        )?;
        let rows = stmt
            .query_map(params![tag], super::files::map_file_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagRow> {
    let tag_type: String = row.get(2)?;
    Ok(TagRow {
        file_id: row.get(0)?,
        tag: row.get(1)?,
        tag_type: tag_type.parse::<TagType>().unwrap_or(TagType::Rule),
    })
}
