//! Phase 1 — fast index (spec.md §4.6), ported from `_phase1_index`: walk
//! one source, batch-insert every directory and file row with no hash or
//! extracted text yet, then bulk-apply rule tags and (on a full scan)
//! delete rows that weren't seen.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::catalog::NewFileRow;
use crate::smb::{mime_for_entry, smb_to_relative, SmbEntry, WalkEntry};
use crate::source::Source;
use crate::types::DIRECTORY_MIME;

use super::{CancelToken, ScanOrchestrator, ScanPhase, ScanState};

pub(super) async fn run_for_source(
    orchestrator: &ScanOrchestrator,
    source: &Source,
    full_scan: bool,
    progress: &Mutex<ScanState>,
    cancel: &CancelToken,
) {
    let label = &source.endpoint.label;

    {
        let mut state = progress.lock().unwrap();
        state.current_source = label.clone();
        state.phase = ScanPhase::Indexing;
    }

    if let Err(e) = orchestrator.backend.register_source(&source.endpoint).await {
        let mut state = progress.lock().unwrap();
        state.record_error(format!("source {}: {e}", source.source_id));
        return;
    }

    let existing: std::collections::HashMap<String, Option<String>> = if full_scan {
        std::collections::HashMap::new()
    } else {
        match orchestrator.catalog.existing_modified_at(label) {
            Ok(rows) => rows.into_iter().collect(),
            Err(e) => {
                progress.lock().unwrap().record_error(format!("source {}: {e}", source.source_id));
                std::collections::HashMap::new()
            }
        }
    };

    let walk = match orchestrator.backend.walk(&source.endpoint).await {
        Ok(entries) => entries,
        Err(e) => {
            progress.lock().unwrap().record_error(format!("source {}: {e}", source.source_id));
            return;
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut batch: Vec<NewFileRow> = Vec::new();
    let root_path = crate::types::LogicalPath::root(label);
    seen.insert(root_path.as_str().to_string());
    batch.push(NewFileRow {
        path: root_path.clone(),
        name: label.clone(),
        parent_path: None,
        is_directory: true,
        size: 0,
        mime_type: DIRECTORY_MIME.to_string(),
        created_at: None,
        modified_at: None,
        indexed_at: now_rfc3339(),
    });

    for WalkEntry { dir_smb_path, entries } in &walk {
        if cancel.is_cancelled() {
            break;
        }

        let dir_path = smb_to_relative(dir_smb_path, &source.endpoint);

        for entry in entries {
            let SmbEntry { name, is_directory, size, modified_at, created_at, .. } = entry;
            let logical = dir_path.join(name);
            seen.insert(logical.as_str().to_string());

            if !*is_directory {
                progress.lock().unwrap().files_scanned += 1;
            }

            let modified_rfc3339 = modified_at.map(|m| m.to_rfc3339());
            if !full_scan && !is_directory {
                if let Some(Some(prev)) = existing.get(logical.as_str()) {
                    if Some(prev.as_str()) == modified_rfc3339.as_deref() {
                        continue;
                    }
                }
            }

            let was_new = !existing.contains_key(logical.as_str());
            batch.push(NewFileRow {
                path: logical.clone(),
                name: name.clone(),
                parent_path: Some(dir_path.as_str().to_string()),
                is_directory: *is_directory,
                size: if *is_directory { 0 } else { *size },
                mime_type: mime_for_entry(name, *is_directory),
                created_at: created_at.map(|c| c.to_rfc3339()),
                modified_at: modified_rfc3339,
                indexed_at: now_rfc3339(),
            });

            if !is_directory {
                let mut state = progress.lock().unwrap();
                if was_new {
                    state.files_added += 1;
                } else {
                    state.files_updated += 1;
                }
            }

            if batch.len() >= orchestrator.config.scan_batch_size {
                flush(orchestrator, progress, &mut batch);
            }
        }
    }

    flush(orchestrator, progress, &mut batch);

    if let Err(e) = orchestrator.catalog.apply_rule_tags(label) {
        progress.lock().unwrap().record_error(format!("source {}: tagging failed: {e}", source.source_id));
    }

    if full_scan && !cancel.is_cancelled() {
        match orchestrator.catalog.remove_stale(label, &seen) {
            Ok(removed) => progress.lock().unwrap().files_removed += removed,
            Err(e) => progress.lock().unwrap().record_error(format!("source {}: stale cleanup failed: {e}", source.source_id)),
        }
    }
}

fn flush(orchestrator: &ScanOrchestrator, progress: &Mutex<ScanState>, batch: &mut Vec<NewFileRow>) {
    if batch.is_empty() {
        return;
    }
    if let Err(e) = orchestrator.catalog.insert_batch(batch) {
        progress.lock().unwrap().record_error(format!("batch insert failed: {e}"));
    }
    batch.clear();
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
