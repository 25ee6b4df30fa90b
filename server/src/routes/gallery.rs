//! `GET /api/gallery` and `GET /api/artwork/{id}/grid`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::warn;

use crate::error::ApiError;
use crate::services::gallery::{self, DEFAULT_PAGE_SIZE, GalleryError, GalleryItem, PAGE_PAUSE};
use crate::services::publish::GridDataFile;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    /// Page size for the indexer walk.
    pub first: Option<u32>,
    /// Case-insensitive artist/title filter.
    pub q: Option<String>,
}

pub(crate) fn status_for(err: &GalleryError) -> StatusCode {
    match err {
        GalleryError::InvalidId(_) => StatusCode::BAD_REQUEST,
        GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
        GalleryError::Request(_) | GalleryError::Status { .. } | GalleryError::Parse(_) | GalleryError::Query(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// # Errors
///
/// 502 when the indexer fails.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Vec<GalleryItem>>, ApiError> {
    let first = query.first.unwrap_or(DEFAULT_PAGE_SIZE);
    let mut items = gallery::list_all(state.indexer.as_ref(), &state.config.gateway_url, first, PAGE_PAUSE)
        .await
        .map_err(|e| ApiError::new(status_for(&e), &e))?;
    if let Some(q) = query.q.as_deref() {
        items.retain(|item| item.matches(q));
    }
    Ok(Json(items))
}

/// # Errors
///
/// 400 for a malformed id, 404 when the grid file is missing, 502 otherwise.
pub async fn artwork_grid(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GridDataFile>, ApiError> {
    gallery::load_grid(state.indexer.as_ref(), &id)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, %id, "gallery: grid load failed");
            ApiError::new(status_for(&e), &e)
        })
}

#[cfg(test)]
#[path = "gallery_test.rs"]
mod tests;
