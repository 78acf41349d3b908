use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::types::{FileRow, LogicalPath};

use super::Catalog;

/// A batch-inserted file or directory row, pre-enrichment.
pub struct NewFileRow {
    pub path: LogicalPath,
    pub name: String,
    pub parent_path: Option<String>,
    pub is_directory: bool,
    pub size: i64,
    pub mime_type: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub indexed_at: String,
}

#[derive(Default, Clone, Copy)]
pub struct FileFilter<'a> {
    pub path_prefix: Option<&'a str>,
    pub is_directory: Option<bool>,
}

impl Catalog {
    /// Inserts or replaces a batch of Phase 1 rows in one transaction
    /// (spec.md §4.6 step 1). `file_hash` and `full_text` are left `NULL`
    /// so Phase 2 can find them via `WHERE file_hash IS NULL`.
    pub fn insert_batch(&self, rows: &[NewFileRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO files
                 (path, name, parent_path, is_directory, size, mime_type, file_hash,
                  created_at, modified_at, indexed_at, full_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8, ?9, NULL)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.path.as_str(),
                    row.name,
                    row.parent_path,
                    row.is_directory as i64,
                    row.size,
                    row.mime_type,
                    row.created_at,
                    row.modified_at,
                    row.indexed_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// `path -> modified_at` for every row under a source, for Phase 1's
    /// incremental skip-set (spec.md §4.6 step 1).
    pub fn existing_modified_at(&self, source_label: &str) -> Result<Vec<(String, Option<String>)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT path, modified_at FROM files WHERE path LIKE ?1")?;
        let like = format!("/{source_label}/%");
        let rows = stmt
            .query_map(params![like], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_by_path(&self, path: &LogicalPath) -> Result<Option<FileRow>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, path, name, parent_path, is_directory, size, mime_type, file_hash,
                        created_at, modified_at, indexed_at, full_text
                 FROM files WHERE path = ?1",
                params![path.as_str()],
                map_file_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list(&self, filter: FileFilter<'_>) -> Result<Vec<FileRow>> {
        let conn = self.conn()?;
        let mut sql = String::from(
            "SELECT id, path, name, parent_path, is_directory, size, mime_type, file_hash,
                    created_at, modified_at, indexed_at, full_text FROM files WHERE 1=1",
        );
        if filter.path_prefix.is_some() {
            sql.push_str(" AND path LIKE ?1");
        }
        if let Some(is_dir) = filter.is_directory {
            sql.push_str(if is_dir { " AND is_directory = 1" } else { " AND is_directory = 0" });
        }
        let mut stmt = conn.prepare(&sql)?;
        let rows = if let Some(prefix) = filter.path_prefix {
            let like = format!("{prefix}%");
            stmt.query_map(params![like], map_file_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
            stmt.query_map([], map_file_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
    }

    /// Rows still missing a content fingerprint — Phase 2's work queue
    /// (spec.md §4.6 step 2).
    pub fn files_needing_enrichment(&self) -> Result<Vec<FileRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, path, name, parent_path, is_directory, size, mime_type, file_hash,
                    created_at, modified_at, indexed_at, full_text
             FROM files WHERE is_directory = 0 AND file_hash IS NULL",
        )?;
        let rows = stmt
            .query_map([], map_file_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Applies a Phase 2 enrichment result: hash and/or extracted text,
    /// each only overwritten when the new value is present (`COALESCE`,
    /// matching the original scanner's update semantics).
    pub fn apply_enrichment(
        &self,
        file_id: i64,
        file_hash: Option<&str>,
        full_text: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE files SET file_hash = COALESCE(?1, file_hash),
                              full_text = COALESCE(?2, full_text)
             WHERE id = ?3",
            params![file_hash, full_text, file_id],
        )?;
        Ok(())
    }

    /// Deletes every row under `source_label` whose path was not observed
    /// in the most recent full scan, plus the source root if absent too
    /// (spec.md §4.6 step 1, full-scan cleanup). Returns the removed count.
    pub fn remove_stale(
        &self,
        source_label: &str,
        seen_paths: &std::collections::HashSet<String>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT path FROM files WHERE path LIKE ?1")?;
        let like = format!("/{source_label}/%");
        let stale: Vec<String> = stmt
            .query_map(params![like], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .filter(|p| !seen_paths.contains(p))
            .collect();

        let mut removed = 0i64;
        for path in &stale {
            conn.execute("DELETE FROM files WHERE path = ?1", params![path])?;
            removed += 1;
        }

        let root = format!("/{source_label}");
        if !seen_paths.contains(&root) {
            removed += conn.execute("DELETE FROM files WHERE path = ?1", params![root])? as i64;
        }

        Ok(removed)
    }

    /// Cascades a source removal: every row rooted at `source_label`, and
    /// (via `ON DELETE CASCADE`) its tags and metadata (spec.md §4.3).
    pub fn purge_source(&self, source_label: &str) -> Result<i64> {
        let conn = self.conn()?;
        let like = format!("/{source_label}");
        let like_children = format!("/{source_label}/%");
        let removed = conn.execute(
            "DELETE FROM files WHERE path = ?1 OR path LIKE ?2",
            params![like, like_children],
        )?;
        Ok(removed as i64)
    }

    pub fn count(&self, filter: FileFilter<'_>) -> Result<i64> {
        let conn = self.conn()?;
        let mut sql = String::from("SELECT count(*) FROM files WHERE 1=1");
        if filter.path_prefix.is_some() {
            sql.push_str(" AND path LIKE ?1");
        }
        if let Some(is_dir) = filter.is_directory {
            sql.push_str(if is_dir { " AND is_directory = 1" } else { " AND is_directory = 0" });
        }
        let mut stmt = conn.prepare(&sql)?;
        let count = if let Some(prefix) = filter.path_prefix {
            let like = format!("{prefix}%");
            stmt.query_row(params![like], |row| row.get(0))?
        } else {
            stmt.query_row([], |row| row.get(0))?
        };
        Ok(count)
    }
}

pub(super) fn map_file_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRow> {
    let path_str: String = row.get(1)?;
    let created_at: Option<String> = row.get(8)?;
    let modified_at: Option<String> = row.get(9)?;
    let indexed_at: String = row.get(10)?;
    Ok(FileRow {
        id: row.get(0)?,
        path: LogicalPath::new(path_str),
        name: row.get(2)?,
        parent_path: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        is_directory: row.get::<_, i64>(4)? != 0,
        size: row.get(5)?,
        mime_type: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        file_hash: row.get(7)?,
        created_at: parse_timestamp(created_at),
        modified_at: parse_timestamp(modified_at),
        indexed_at: parse_timestamp(Some(indexed_at)),
        full_text: row.get(11)?,
    })
}

fn parse_timestamp(value: Option<String>) -> chrono::DateTime<chrono::Utc> {
    value
        .and_then(|v| chrono::DateTime::parse_from_rfc3339(&v).ok())
        .map(|v| v.with_timezone(&chrono::Utc))
        .unwrap_or_else(chrono::Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample_row(path: &str, name: &str) -> NewFileRow {
        NewFileRow {
            path: LogicalPath::new(path),
            name: name.to_string(),
            parent_path: Some("/media".to_string()),
            is_directory: false,
            size: 1024,
            mime_type: "text/plain".to_string(),
            created_at: Some("2024-01-01T00:00:00Z".to_string()),
            modified_at: Some("2024-01-01T00:00:00Z".to_string()),
            indexed_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[sample_row("/media/a.txt", "a.txt")])
            .unwrap();
        let row = catalog
            .get_by_path(&LogicalPath::new("/media/a.txt"))
            .unwrap()
            .expect("row present");
        assert_eq!(row.name, "a.txt");
        assert!(!row.is_enriched());
    }

    #[test]
    fn needing_enrichment_excludes_directories_and_hashed_files() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[
                sample_row("/media/a.txt", "a.txt"),
                NewFileRow {
                    is_directory: true,
                    mime_type: "inode/directory".to_string(),
                    ..sample_row("/media/dir", "dir")
                },
            ])
            .unwrap();
        let pending = catalog.files_needing_enrichment().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "a.txt");

        catalog
            .apply_enrichment(pending[0].id, Some("abcd1234"), Some("hello"))
            .unwrap();
        assert!(catalog.files_needing_enrichment().unwrap().is_empty());
    }

    #[test]
    fn remove_stale_deletes_unseen_rows_only() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[sample_row("/media/a.txt", "a.txt"), sample_row("/media/b.txt", "b.txt")])
            .unwrap();
        let mut seen = HashSet::new();
        seen.insert("/media".to_string());
        seen.insert("/media/a.txt".to_string());

        let removed = catalog.remove_stale("media", &seen).unwrap();
        assert_eq!(removed, 1);
        assert!(catalog.get_by_path(&LogicalPath::new("/media/b.txt")).unwrap().is_none());
        assert!(catalog.get_by_path(&LogicalPath::new("/media/a.txt")).unwrap().is_some());
    }

    #[test]
    fn purge_source_removes_root_and_descendants() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[sample_row("/media", "media"), sample_row("/media/a.txt", "a.txt")])
            .unwrap();
        let removed = catalog.purge_source("media").unwrap();
        assert_eq!(removed, 2);
    }
}
