//! Route composition, grounded in the teacher's `routes::create_api_router`
//! — one nested `/api/v1` router — scoped down to spec.md §6's HTTP-facing
//! contracts only (no browse/search/dashboard/preview bodies).

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers::{resolve, scan, sources};
use crate::state::AppState;

pub fn create_api_router(state: AppState) -> Router<AppState> {
    let v1 = Router::new()
        .route("/scan/state", get(scan::scan_state_handler))
        .route("/scan/start", post(scan::start_scan_handler))
        .route("/scan/stop", post(scan::stop_scan_handler))
        .route("/scan/history", get(scan::scan_history_handler))
        .route("/sources", get(sources::list_sources_handler).post(sources::add_source_handler))
        .route("/sources/status", get(sources::connection_status_handler))
        .route("/sources/{source_id}", delete(sources::remove_source_handler))
        .route("/resolve", get(resolve::resolve_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
