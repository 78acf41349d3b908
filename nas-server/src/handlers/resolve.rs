//! Logical-to-SMB path resolution for streaming collaborators (spec.md
//! §4.8/§6).

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use nas_core::types::LogicalPath;

use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub smb_path: String,
}

pub async fn resolve_handler(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<impl IntoResponse> {
    let logical = LogicalPath::new(query.path);
    let smb_path = state.resolver.resolve(&logical)?;
    Ok(Json(ResolveResponse { smb_path }))
}
