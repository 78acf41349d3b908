use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Catalog;

/// Top-line counters, ported from the prototype's `/api/dashboard`
/// endpoint (supplemented feature, SPEC_FULL.md §9).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DashboardStats {
    pub total_size: i64,
    pub total_files: i64,
    pub total_directories: i64,
    pub unique_hashes: i64,
    pub duplicate_groups: i64,
    pub duplicate_wasted_bytes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
    pub total_size: i64,
}

/// A set of files sharing a content fingerprint. The hash is a similarity
/// hint (see `FileRow::file_hash`), so this is a *probable* duplicate
/// group, never asserted as confirmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DuplicateGroup {
    pub file_hash: String,
    pub count: i64,
    pub size: i64,
    pub wasted_bytes: i64,
    pub paths: Vec<String>,
}

impl Catalog {
    pub fn dashboard_stats(&self) -> Result<DashboardStats> {
        let conn = self.conn()?;
        let (total_size, total_files, total_directories): (i64, i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN is_directory = 0 THEN size ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_directory = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_directory = 1 THEN 1 ELSE 0 END), 0)
             FROM files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let unique_hashes: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT file_hash) FROM files
             WHERE file_hash IS NOT NULL AND is_directory = 0",
            [],
            |row| row.get(0),
        )?;

        let (duplicate_groups, duplicate_wasted_bytes): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(wasted), 0) FROM (
                SELECT (COUNT(*) - 1) * size as wasted
                FROM files
                WHERE file_hash IS NOT NULL AND is_directory = 0
                GROUP BY file_hash HAVING COUNT(*) > 1
             )",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DashboardStats {
            total_size,
            total_files,
            total_directories,
            unique_hashes,
            duplicate_groups,
            duplicate_wasted_bytes,
        })
    }

    /// Storage broken down into coarse MIME categories, largest first.
    pub fn by_mime_category(&self) -> Result<Vec<CategoryCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT
                CASE
                    WHEN mime_type LIKE 'video/%' THEN 'Video'
                    WHEN mime_type LIKE 'audio/%' THEN 'Audio'
                    WHEN mime_type LIKE 'image/%' THEN 'Image'
                    WHEN mime_type LIKE 'text/%' THEN 'Text'
                    WHEN mime_type = 'application/pdf' THEN 'PDF'
                    WHEN mime_type LIKE '%document%' OR mime_type LIKE '%word%' THEN 'Document'
                    WHEN mime_type LIKE '%spreadsheet%' OR mime_type LIKE '%excel%' THEN 'Spreadsheet'
                    WHEN mime_type LIKE '%presentation%' OR mime_type LIKE '%powerpoint%' THEN 'Presentation'
                    WHEN mime_type LIKE '%zip%' OR mime_type LIKE '%compressed%' OR mime_type LIKE '%archive%' THEN 'Archive'
                    ELSE 'Other'
                END as category,
                COUNT(*) as count,
                SUM(size) as total_size
             FROM files
             WHERE is_directory = 0
             GROUP BY category
             ORDER BY total_size DESC
             LIMIT 20",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CategoryCount {
                    category: row.get(0)?,
                    count: row.get(1)?,
                    total_size: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Probable-duplicate groups ordered by wasted space, largest first.
    pub fn duplicate_groups(&self, limit: i64) -> Result<Vec<DuplicateGroup>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT file_hash, COUNT(*) as count, size, (COUNT(*) - 1) * size as wasted_bytes,
                    GROUP_CONCAT(path, '\u{1}') as paths
             FROM files
             WHERE file_hash IS NOT NULL AND is_directory = 0
             GROUP BY file_hash
             HAVING COUNT(*) > 1
             ORDER BY wasted_bytes DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let paths: String = row.get(4)?;
                Ok(DuplicateGroup {
                    file_hash: row.get(0)?,
                    count: row.get(1)?,
                    size: row.get(2)?,
                    wasted_bytes: row.get(3)?,
                    paths: paths.split('\u{1}').map(|s| s.to_string()).collect(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// `(path, total_size, file_count)` per top-level directory, used for
    /// the storage-treemap view.
    pub fn storage_by_parent(&self, limit: i64) -> Result<Vec<(String, i64, i64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT parent_path, SUM(size), COUNT(*)
             FROM files WHERE is_directory = 0
             GROUP BY parent_path ORDER BY SUM(size) DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, Option<String>>(0)?.unwrap_or_default(), row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::files::NewFileRow;
    use crate::types::LogicalPath;

    fn row(path: &str, size: i64) -> NewFileRow {
        NewFileRow {
            path: LogicalPath::new(path),
            name: path.rsplit('/').next().unwrap().to_string(),
            parent_path: Some("/media".into()),
            is_directory: false,
            size,
            mime_type: "video/mp4".into(),
            created_at: None,
            modified_at: None,
            indexed_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn stats_count_files_and_directories_separately() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[row("/media/a.mp4", 100), row("/media/b.mp4", 200)])
            .unwrap();
        let stats = catalog.dashboard_stats().unwrap();
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 300);
    }

    #[test]
    fn duplicate_groups_need_matching_hash_and_more_than_one_file() {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .insert_batch(&[row("/media/a.mp4", 100), row("/media/b.mp4", 100)])
            .unwrap();
        let a = catalog.get_by_path(&LogicalPath::new("/media/a.mp4")).unwrap().unwrap();
        let b = catalog.get_by_path(&LogicalPath::new("/media/b.mp4")).unwrap().unwrap();
        catalog.apply_enrichment(a.id, Some("deadbeef"), None).unwrap();
        catalog.apply_enrichment(b.id, Some("deadbeef"), None).unwrap();

        let groups = catalog.duplicate_groups(20).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].wasted_bytes, 100);
    }
}
