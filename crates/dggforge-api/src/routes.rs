use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use dggforge_core::family::GridFamily;
use dggforge_engines::{Artifact, GridRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Default upper resolution for statistics requests.
const DEFAULT_MAX_RESOLUTION: u32 = 15;

#[derive(Debug, Deserialize)]
pub struct GridGenParams {
    pub bbox: Option<String>,
    pub format: Option<String>,
    /// `1` requests dateline splitting of crossing cells.
    pub interrupt: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct GridStatsParams {
    pub max_resolution: Option<u32>,
    pub format: Option<String>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/", get(home))
        .route("/api/grid_gen/{base_dggs}/{resolution}", get(handle_grid_gen))
        .route("/api/grid_stats/{base_dggs}", get(handle_grid_stats))
        .with_state(state)
}

async fn home(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.dispatcher.config();
    Json(serde_json::json!({
        "status": "OK",
        "message": format!(
            "dggrid: {}; tmp_dir: {} -> ready",
            config.dggrid_path.display(),
            config.scratch_dir.display()
        ),
    }))
}

async fn handle_grid_gen(
    State(state): State<Arc<AppState>>,
    Path((base_dggs, resolution)): Path<(String, u32)>,
    Query(params): Query<GridGenParams>,
) -> Result<Response, ApiError> {
    tracing::info!(
        family = %base_dggs,
        resolution,
        bbox = ?params.bbox,
        format = ?params.format,
        interrupt = ?params.interrupt,
        "grid generation request"
    );

    let request = GridRequest::parse(
        &base_dggs,
        resolution,
        params.bbox.as_deref(),
        params.format.as_deref(),
        params.interrupt == Some(1),
    )?;

    // Generation blocks on process execution and GDAL I/O; keep it off the
    // async workers.
    let dispatcher = state.dispatcher.clone();
    let artifact = tokio::task::spawn_blocking(move || dispatcher.generate(&request))
        .await
        .map_err(|err| ApiError::internal("Generation task failed").with_details(err.to_string()))??;

    file_response(&artifact).await
}

async fn handle_grid_stats(
    State(state): State<Arc<AppState>>,
    Path(base_dggs): Path<String>,
    Query(params): Query<GridStatsParams>,
) -> Result<Response, ApiError> {
    let family = GridFamily::parse(&base_dggs)?;
    let max_resolution = params.max_resolution.unwrap_or(DEFAULT_MAX_RESOLUTION);
    let as_csv = params
        .format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("CSV"));

    tracing::info!(family = %family, max_resolution, as_csv, "grid statistics request");

    let dispatcher = state.dispatcher.clone();
    if as_csv {
        let artifact =
            tokio::task::spawn_blocking(move || dispatcher.stats_csv(family, max_resolution))
                .await
                .map_err(|err| {
                    ApiError::internal("Statistics task failed").with_details(err.to_string())
                })??;
        return file_response(&artifact).await;
    }

    let table = tokio::task::spawn_blocking(move || dispatcher.stats(family, max_resolution))
        .await
        .map_err(|err| ApiError::internal("Statistics task failed").with_details(err.to_string()))??;

    let rows = serde_json::to_value(&table)
        .map_err(|err| ApiError::internal("Statistics serialization failed").with_details(err.to_string()))?;
    let mut body = serde_json::Map::new();
    body.insert(family.name().to_string(), rows);

    Ok(Json(serde_json::Value::Object(body)).into_response())
}

/// Serve an artifact as a download with its presentation filename.
async fn file_response(artifact: &Artifact) -> Result<Response, ApiError> {
    let body = tokio::fs::read(&artifact.path).await.map_err(|err| {
        ApiError::internal("Artifact unavailable").with_details(format!(
            "{}: {}",
            artifact.path.display(),
            err
        ))
    })?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|err| ApiError::internal("Invalid artifact filename").with_details(err.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.media_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
