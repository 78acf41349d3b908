//! Scan lifecycle handlers (spec.md §6): report state, start/stop, list
//! history. Grounded in the teacher's `handle_scan.rs` handler shapes,
//! minus the SSE/websocket progress streaming this spec doesn't need.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartScanRequest {
    #[serde(default)]
    pub full_scan: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

pub async fn scan_state_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.lifecycle.scan_state())
}

pub async fn start_scan_handler(
    State(state): State<AppState>,
    Json(request): Json<StartScanRequest>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.lifecycle.start_scan(request.full_scan)?;
    Ok(Json(snapshot))
}

pub async fn stop_scan_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.lifecycle.stop_scan();
    Json(state.lifecycle.scan_state())
}

pub async fn scan_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let history = state.lifecycle.recent_scan_logs(limit)?;
    Ok(Json(history))
}
