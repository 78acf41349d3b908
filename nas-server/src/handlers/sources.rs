//! Source CRUD and connection-status handlers (spec.md §4.3/§6), shaped
//! after `nas-explorer/app/routes/admin.py`'s `source_id`/`connected`/
//! `purged_files` JSON (spec.md §9 supplemented-features note).

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::state::AppState;

/// Never carries credentials back to the client.
#[derive(Debug, Serialize)]
pub struct SourceDto {
    pub source_id: String,
    pub host: String,
    pub share: String,
    pub label: String,
    pub subfolder: String,
}

impl From<nas_core::source::Source> for SourceDto {
    fn from(source: nas_core::source::Source) -> Self {
        Self {
            source_id: source.source_id,
            host: source.endpoint.host,
            share: source.endpoint.share,
            label: source.endpoint.label,
            subfolder: source.endpoint.subfolder,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddSourceRequest {
    pub host: String,
    pub share: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_subfolder")]
    pub subfolder: String,
    #[serde(default)]
    pub label: String,
}

fn default_subfolder() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize)]
pub struct RemoveSourceResponse {
    pub source_id: String,
    pub purged_files: i64,
}

pub async fn list_sources_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let sources = state.sources.list_sources()?;
    let dtos: Vec<SourceDto> = sources.into_iter().map(SourceDto::from).collect();
    Ok(Json(dtos))
}

pub async fn add_source_handler(
    State(state): State<AppState>,
    Json(request): Json<AddSourceRequest>,
) -> AppResult<impl IntoResponse> {
    let source = state
        .sources
        .add_source(
            state.backend.as_ref(),
            &request.host,
            &request.share,
            &request.username,
            &request.password,
            &request.subfolder,
            &request.label,
        )
        .await?;
    Ok(Json(SourceDto::from(source)))
}

pub async fn remove_source_handler(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let purged_files = state.sources.remove_source(&source_id, &state.catalog)?;
    Ok(Json(RemoveSourceResponse { source_id, purged_files }))
}

pub async fn connection_status_handler(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let status = state.sources.connection_status(state.backend.as_ref()).await?;
    Ok(Json(status))
}
