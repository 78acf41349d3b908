//! Lifecycle controller (spec.md §4.7): owns the single scan-state record
//! and drives a scan's background task, mirroring the original
//! `start_scan`/`stop_scan`/`get_scan_state` globals but with an owned
//! `JoinHandle` and an explicit cancel token instead of module statics.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::catalog::Catalog;
use crate::error::{CoreError, Result};
use crate::scanner::{CancelToken, ScanOrchestrator, ScanPhase, ScanState};
use crate::source::SourceManager;
use crate::types::ScanStatus;

pub struct LifecycleController {
    catalog: Catalog,
    sources: Arc<SourceManager>,
    orchestrator: Arc<ScanOrchestrator>,
    state: Arc<Mutex<ScanState>>,
    cancel: Mutex<CancelToken>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleController {
    pub fn new(catalog: Catalog, sources: Arc<SourceManager>, orchestrator: Arc<ScanOrchestrator>) -> Self {
        Self {
            catalog,
            sources,
            orchestrator,
            state: Arc::new(Mutex::new(ScanState::default())),
            cancel: Mutex::new(CancelToken::new()),
            handle: Mutex::new(None),
        }
    }

    pub fn scan_state(&self) -> ScanState {
        self.state.lock().unwrap().clone()
    }

    /// Starts a background scan. `EScanBusy` if one is already running,
    /// `ENoSources` if nothing is configured — both without side effects
    /// (spec.md §7).
    pub fn start_scan(&self, full_scan: bool) -> Result<ScanState> {
        {
            let state = self.state.lock().unwrap();
            if state.running {
                return Err(CoreError::ScanBusy);
            }
        }

        if self.sources.list_sources()?.is_empty() {
            return Err(CoreError::NoSources);
        }

        let started_at = Utc::now();
        let scan_id = self.catalog.start_scan_log(started_at)?;

        let snapshot = {
            let mut state = self.state.lock().unwrap();
            *state = ScanState {
                running: true,
                scan_id: Some(scan_id),
                phase: ScanPhase::Indexing,
                started_at: Some(started_at),
                ..ScanState::default()
            };
            state.clone()
        };

        let cancel = CancelToken::new();
        *self.cancel.lock().unwrap() = cancel.clone();

        let orchestrator = self.orchestrator.clone();
        let catalog = self.catalog.clone();
        let state_handle = self.state.clone();
        let task_cancel = cancel;

        let handle = tokio::spawn(async move {
            let outcome = orchestrator.run(&state_handle, &task_cancel, full_scan).await;
            let finished_at = Utc::now();

            let (status, final_snapshot) = {
                let mut state = state_handle.lock().unwrap();
                let status = match outcome {
                    Ok(outcome) => outcome.status,
                    Err(e) => {
                        state.record_error(format!("scan failed: {e}"));
                        ScanStatus::Failed
                    }
                };
                state.running = false;
                state.phase = ScanPhase::Idle;
                (status, state.clone())
            };

            if let Err(e) = catalog.finish_scan_log(
                scan_id,
                finished_at,
                status,
                final_snapshot.files_scanned,
                final_snapshot.files_added,
                final_snapshot.files_updated,
                final_snapshot.files_removed,
                final_snapshot.errors,
                &final_snapshot.error_log,
            ) {
                tracing::error!(scan_id, error = %e, "failed to write final scan_log row");
            }
        });

        *self.handle.lock().unwrap() = Some(handle);

        Ok(snapshot)
    }

    /// Signals the running scan to stop at its next cooperative check
    /// point. A no-op if nothing is running.
    pub fn stop_scan(&self) {
        let running = self.state.lock().unwrap().running;
        if !running {
            return;
        }
        self.cancel.lock().unwrap().cancel();
    }

    pub fn recent_scan_logs(&self, limit: i64) -> Result<Vec<crate::types::ScanLogRow>> {
        self.catalog.recent_scan_logs(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScanConfig;
    use crate::smb::{SmbBackend, SmbEndpoint, SmbEntry, WalkEntry};
    use async_trait::async_trait;
    use nas_contracts::{MetadataExtractor, TextExtractor};
    use serde_json::Value;
    use std::path::Path;

    struct EmptyBackend;

    #[async_trait]
    impl SmbBackend for EmptyBackend {
        async fn register_source(&self, _endpoint: &SmbEndpoint) -> Result<()> {
            Ok(())
        }
        async fn walk(&self, endpoint: &SmbEndpoint) -> Result<Vec<WalkEntry>> {
            Ok(vec![WalkEntry { dir_smb_path: endpoint.smb_root(), entries: Vec::<SmbEntry>::new() }])
        }
        async fn stat(&self, _smb_path: &str) -> Result<Option<SmbEntry>> {
            Ok(None)
        }
        async fn read_bytes(&self, _smb_path: &str, _max_bytes: u64) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn read_tail(&self, _smb_path: &str, _tail_bytes: u64) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn download_to_temp(&self, _smb_path: &str) -> Result<std::path::PathBuf> {
            Ok(std::path::PathBuf::new())
        }
        fn cleanup_temp(&self, _path: &std::path::Path) {}
        async fn discover_shares(&self, _host: &str, _username: &str, _password: &str) -> Vec<String> {
            Vec::new()
        }
        async fn test_connection(&self, _endpoint: &SmbEndpoint) -> Result<String> {
            Ok("ok".to_string())
        }
    }

    struct NoopText;
    #[async_trait]
    impl TextExtractor for NoopText {
        async fn extract_text(&self, _local_path: &Path, _mime: &str) -> Option<String> {
            None
        }
    }

    struct NoopMetadata;
    #[async_trait]
    impl MetadataExtractor for NoopMetadata {
        async fn extract_metadata(&self, _local_path: &Path, _mime: &str) -> Option<Value> {
            None
        }
    }

    fn test_config() -> ScanConfig {
        ScanConfig {
            scan_batch_size: 1000,
            hash_sample_size_kb: 64,
            max_text_extract_mb: 100,
            max_text_store_kb: 50,
            enrichment_workers: 2,
        }
    }

    async fn controller_with_source(dir: &std::path::Path) -> LifecycleController {
        let catalog = Catalog::open_in_memory().unwrap();
        let sources = Arc::new(
            SourceManager::open(&dir.join("nas_connection.json"), &dir.join(".encryption_key")).unwrap(),
        );
        let backend: Arc<dyn SmbBackend> = Arc::new(EmptyBackend);
        sources
            .add_source(backend.as_ref(), "nas.local", "media", "u", "p", "/", "media")
            .await
            .unwrap();

        let orchestrator = Arc::new(ScanOrchestrator::new(
            catalog.clone(),
            sources.clone(),
            backend,
            Arc::new(NoopText),
            Arc::new(NoopMetadata),
            test_config(),
        ));
        LifecycleController::new(catalog, sources, orchestrator)
    }

    #[tokio::test]
    async fn second_start_while_running_is_scan_busy() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller_with_source(dir.path()).await;

        controller.start_scan(false).unwrap();
        let err = controller.start_scan(false).unwrap_err();
        assert!(matches!(err, CoreError::ScanBusy));
    }

    #[tokio::test]
    async fn starting_with_no_sources_fails_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open_in_memory().unwrap();
        let sources = Arc::new(
            SourceManager::open(&dir.path().join("nas_connection.json"), &dir.path().join(".encryption_key"))
                .unwrap(),
        );
        let backend: Arc<dyn SmbBackend> = Arc::new(EmptyBackend);
        let orchestrator = Arc::new(ScanOrchestrator::new(
            catalog.clone(),
            sources.clone(),
            backend,
            Arc::new(NoopText),
            Arc::new(NoopMetadata),
            test_config(),
        ));
        let controller = LifecycleController::new(catalog, sources, orchestrator);

        let err = controller.start_scan(false).unwrap_err();
        assert!(matches!(err, CoreError::NoSources));
        assert!(controller.recent_scan_logs(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_runs_to_completion_and_updates_state() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller_with_source(dir.path()).await;

        controller.start_scan(false).unwrap();
        for _ in 0..50 {
            if !controller.scan_state().running {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(!controller.scan_state().running);
        let logs = controller.recent_scan_logs(1).unwrap();
        assert_eq!(logs[0].status, ScanStatus::Completed);
    }
}
