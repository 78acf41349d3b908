//! NAS catalog server: loads configuration, opens the catalog database and
//! credential-backed source manager, wires the SMB backend and scan
//! lifecycle controller, and serves the HTTP contracts from spec.md §6.
//!
//! Scoped down from the teacher's `ferrex-server::main` (Postgres, Redis,
//! FFmpeg transcoding, WebSocket sync-playback, device/PIN auth) to just
//! what this indexer needs: one SQLite-backed catalog, one SMB client, one
//! scan lifecycle, one bearer-token guard.

mod auth;
mod errors;
mod extractors;
mod handlers;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use nas_core::catalog::Catalog;
use nas_core::lifecycle::LifecycleController;
use nas_core::resolver::PathResolver;
use nas_core::scanner::{ScanConfig, ScanOrchestrator};
use nas_core::smb::{SmbBackend, SmbClientBackend};
use nas_core::source::SourceManager;

use crate::auth::BearerAuthGuard;
use crate::extractors::{NullMetadataExtractor, NullTextExtractor};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "nas-server")]
#[command(about = "Read-only SMB catalog indexer and scan control API")]
struct Args {
    /// Path to a TOML config file. Defaults to `./nas-config.toml`.
    #[arg(long, env = "NAS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[arg(long, env = "SERVER_PORT")]
    port: Option<u16>,

    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    nas_config::init_tracing("nas_server=info,nas_core=info,tower_http=info");

    let config_path = args.config.unwrap_or_else(|| PathBuf::from("./nas-config.toml"));
    let mut config = nas_config::Config::load(Some(&config_path))?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    config.ensure_dirs()?;

    if config.is_dev_mode() {
        tracing::warn!("auth_token is still the default; running in dev mode (auth disabled)");
    }

    let config = Arc::new(config);

    let catalog = Catalog::open(&config.database_path)?;
    let sources = Arc::new(SourceManager::open(&config.sources_path(), &config.encryption_key_path())?);
    let backend: Arc<dyn SmbBackend> = Arc::new(SmbClientBackend::new(config.cache_path.clone())?);
    let resolver = Arc::new(PathResolver::new(sources.clone()));

    let scan_config = ScanConfig {
        scan_batch_size: config.scan_batch_size,
        hash_sample_size_kb: config.hash_sample_size_kb,
        max_text_extract_mb: config.max_text_extract_mb,
        max_text_store_kb: config.max_text_store_kb,
        enrichment_workers: config.enrichment_workers,
    };
    let orchestrator = Arc::new(ScanOrchestrator::new(
        catalog.clone(),
        sources.clone(),
        backend.clone(),
        Arc::new(NullTextExtractor),
        Arc::new(NullMetadataExtractor),
        scan_config,
    ));
    let lifecycle = Arc::new(LifecycleController::new(catalog.clone(), sources.clone(), orchestrator));

    let auth = Arc::new(BearerAuthGuard::new(config.auth_token.clone(), config.is_dev_mode()));

    let state = AppState {
        config: config.clone(),
        catalog,
        sources,
        resolver,
        backend,
        lifecycle,
        auth,
    };

    let app = routes::create_api_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(%addr, "nas-server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
