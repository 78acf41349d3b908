//! Shared application state (spec.md §6), grounded in the teacher's
//! `ferrex-server::infra::app_state::AppState`: a `Clone`-able handle with
//! every collaborator behind an `Arc`, threaded through axum's `State`
//! extractor.

use std::fmt;
use std::sync::Arc;

use nas_core::catalog::Catalog;
use nas_core::lifecycle::LifecycleController;
use nas_core::resolver::PathResolver;
use nas_core::smb::SmbBackend;
use nas_core::source::SourceManager;
use nas_contracts::AuthGuard;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<nas_config::Config>,
    pub catalog: Catalog,
    pub sources: Arc<SourceManager>,
    pub resolver: Arc<PathResolver>,
    pub backend: Arc<dyn SmbBackend>,
    pub lifecycle: Arc<LifecycleController>,
    pub auth: Arc<dyn AuthGuard>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
