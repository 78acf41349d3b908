//! Two-phase scan orchestrator (spec.md §4.6), ported from `scanner.py`:
//! a sequential Phase 1 fast index per source, followed by a globally
//! parallel Phase 2 enrichment pass over every row still missing a
//! content fingerprint.

mod fingerprint;
mod phase1;
mod phase2;

pub use fingerprint::{fingerprint, sample_plan};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use nas_contracts::{MetadataExtractor, TextExtractor};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::resolver::PathResolver;
use crate::smb::SmbBackend;
use crate::source::SourceManager;
use crate::types::ScanStatus;

/// Single-writer, multi-reader cancellation signal (spec.md §4.7, §5):
/// the lifecycle controller sets it, the orchestrator and Phase 2 workers
/// poll it.
#[derive(Clone)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    Idle,
    Indexing,
    Enriching,
}

/// Mirrors the original `_scan_state` dict (spec.md §4.7, §8 invariants):
/// every read is a snapshot copy; every write happens under the owning
/// mutex (held by the lifecycle controller, not this struct).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanState {
    pub running: bool,
    pub scan_id: Option<i64>,
    pub phase: ScanPhase,
    pub files_scanned: i64,
    pub files_added: i64,
    pub files_updated: i64,
    pub files_removed: i64,
    pub files_enriched: i64,
    pub files_to_enrich: i64,
    pub errors: i64,
    pub current_source: String,
    pub started_at: Option<DateTime<Utc>>,
    pub error_log: Vec<String>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            running: false,
            scan_id: None,
            phase: ScanPhase::Idle,
            files_scanned: 0,
            files_added: 0,
            files_updated: 0,
            files_removed: 0,
            files_enriched: 0,
            files_to_enrich: 0,
            errors: 0,
            current_source: String::new(),
            started_at: None,
            error_log: Vec::new(),
        }
    }
}

impl ScanState {
    const MAX_ERROR_LOG: usize = 100;

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.errors += 1;
        self.error_log.push(message.into());
        if self.error_log.len() > Self::MAX_ERROR_LOG {
            let overflow = self.error_log.len() - Self::MAX_ERROR_LOG;
            self.error_log.drain(0..overflow);
        }
    }
}

/// The outcome a finished scan reports back to the lifecycle controller
/// for writing the final `ScanLogRow`.
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub failure_message: Option<String>,
}

/// Fixed Phase 1/Phase 2 configuration, resolved once from `nas-config`
/// at startup (spec.md §6).
pub struct ScanConfig {
    pub scan_batch_size: usize,
    pub hash_sample_size_kb: u64,
    pub max_text_extract_mb: u64,
    pub max_text_store_kb: u64,
    pub enrichment_workers: usize,
}

pub struct ScanOrchestrator {
    catalog: Catalog,
    sources: Arc<SourceManager>,
    backend: Arc<dyn SmbBackend>,
    resolver: PathResolver,
    text_extractor: Arc<dyn TextExtractor>,
    metadata_extractor: Arc<dyn MetadataExtractor>,
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(
        catalog: Catalog,
        sources: Arc<SourceManager>,
        backend: Arc<dyn SmbBackend>,
        text_extractor: Arc<dyn TextExtractor>,
        metadata_extractor: Arc<dyn MetadataExtractor>,
        config: ScanConfig,
    ) -> Self {
        let resolver = PathResolver::new(sources.clone());
        Self {
            catalog,
            sources,
            backend,
            resolver,
            text_extractor,
            metadata_extractor,
            config,
        }
    }

    /// Runs Phase 1 across every configured source, then Phase 2 across
    /// the whole catalog, mutating `progress` as it goes (spec.md §4.6
    /// "Ordering, batching, and failures": Phase 1 must complete for a
    /// source before Phase 2 begins globally).
    pub async fn run(
        &self,
        progress: &Mutex<ScanState>,
        cancel: &CancelToken,
        full_scan: bool,
    ) -> Result<ScanOutcome> {
        let sources = self.sources.list_sources()?;

        for source in &sources {
            if cancel.is_cancelled() {
                break;
            }
            phase1::run_for_source(self, source, full_scan, progress, cancel).await;
        }

        if !cancel.is_cancelled() {
            {
                let mut state = progress.lock().unwrap();
                state.phase = ScanPhase::Enriching;
            }
            phase2::run(self, progress, cancel).await?;
        }

        let status = if cancel.is_cancelled() {
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };
        Ok(ScanOutcome { status, failure_message: None })
    }
}
