use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::types::{ScanLogRow, ScanStatus};

use super::Catalog;

const MAX_ERROR_LOG: usize = 100;

impl Catalog {
    /// Appends a new `running` scan_log row, returning its id.
    pub fn start_scan_log(&self, started_at: chrono::DateTime<chrono::Utc>) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO scan_log (started_at, status) VALUES (?1, 'running')",
            params![started_at.to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Finalizes a scan_log row. `error_log` is truncated to the most
    /// recent 100 entries (spec.md §4.7).
    #[allow(clippy::too_many_arguments)]
    pub fn finish_scan_log(
        &self,
        scan_id: i64,
        completed_at: chrono::DateTime<chrono::Utc>,
        status: ScanStatus,
        files_scanned: i64,
        files_added: i64,
        files_updated: i64,
        files_removed: i64,
        errors: i64,
        error_log: &[String],
    ) -> Result<()> {
        let conn = self.conn()?;
        let tail_start = error_log.len().saturating_sub(MAX_ERROR_LOG);
        let json = serde_json::to_string(&error_log[tail_start..])?;
        conn.execute(
            "UPDATE scan_log SET completed_at=?1, status=?2, files_scanned=?3, files_added=?4,
                                 files_updated=?5, files_removed=?6, errors=?7, error_log=?8
             WHERE id=?9",
            params![
                completed_at.to_rfc3339(),
                status.as_str(),
                files_scanned,
                files_added,
                files_updated,
                files_removed,
                errors,
                json,
                scan_id,
            ],
        )?;
        Ok(())
    }

    pub fn get_scan_log(&self, scan_id: i64) -> Result<Option<ScanLogRow>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, started_at, completed_at, status, files_scanned, files_added,
                        files_updated, files_removed, errors, error_log
                 FROM scan_log WHERE id = ?1",
                params![scan_id],
                map_scan_log_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Most recent scans first, newest `limit` entries (spec.md §6 scan
    /// history endpoint).
    pub fn recent_scan_logs(&self, limit: i64) -> Result<Vec<ScanLogRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, started_at, completed_at, status, files_scanned, files_added,
                    files_updated, files_removed, errors, error_log
             FROM scan_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], map_scan_log_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_scan_log_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScanLogRow> {
    let started_at: String = row.get(1)?;
    let completed_at: Option<String> = row.get(2)?;
    let status: String = row.get(3)?;
    let error_log: Option<String> = row.get(9)?;
    Ok(ScanLogRow {
        id: row.get(0)?,
        started_at: parse_rfc3339(&started_at),
        completed_at: completed_at.map(|v| parse_rfc3339(&v)),
        status: status.parse::<ScanStatus>().unwrap_or(ScanStatus::Failed),
        files_scanned: row.get(4)?,
        files_added: row.get(5)?,
        files_updated: row.get(6)?,
        files_removed: row.get(7)?,
        errors: row.get(8)?,
        error_log: error_log
            .and_then(|j| serde_json::from_str(&j).ok())
            .unwrap_or_default(),
    })
}

fn parse_rfc3339(value: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|v| v.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_finish_and_fetch_round_trip() {
        let catalog = Catalog::open_in_memory().unwrap();
        let now = chrono::Utc::now();
        let id = catalog.start_scan_log(now).unwrap();

        let errors: Vec<String> = (0..150).map(|i| format!("err-{i}")).collect();
        catalog
            .finish_scan_log(id, now, ScanStatus::Completed, 10, 5, 2, 0, 150, &errors)
            .unwrap();

        let row = catalog.get_scan_log(id).unwrap().unwrap();
        assert_eq!(row.status, ScanStatus::Completed);
        assert_eq!(row.error_log.len(), 100);
        assert_eq!(row.error_log.first().unwrap(), "err-50");
    }

    #[test]
    fn recent_logs_ordered_newest_first() {
        let catalog = Catalog::open_in_memory().unwrap();
        let now = chrono::Utc::now();
        let first = catalog.start_scan_log(now).unwrap();
        let second = catalog.start_scan_log(now).unwrap();

        let logs = catalog.recent_scan_logs(10).unwrap();
        assert_eq!(logs[0].id, second);
        assert_eq!(logs[1].id, first);
    }
}
