//! `POST /api/publish`: upload an artwork and return its links.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::error;

use crate::error::{ApiError, ApiJson};
use crate::services::publish::{self, PublishError, PublishReceipt, PublishRequest};
use crate::state::AppState;

pub(crate) fn status_for(err: &PublishError) -> StatusCode {
    match err {
        PublishError::MissingField(_) => StatusCode::BAD_REQUEST,
        PublishError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        PublishError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        PublishError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PublishError::Request(_) | PublishError::Rejected { .. } | PublishError::Parse(_) => StatusCode::BAD_GATEWAY,
    }
}

/// # Errors
///
/// See [`status_for`] for the status of each failure.
pub async fn publish(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PublishRequest>,
) -> Result<Json<PublishReceipt>, ApiError> {
    let Some(uploader) = state.uploader.as_deref() else {
        return Err(ApiError::new(StatusCode::SERVICE_UNAVAILABLE, &PublishError::NotConfigured));
    };
    publish::publish(uploader, &state.publish_settings(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "publish: failed");
            ApiError::new(status_for(&e), &e)
        })
}

#[cfg(test)]
#[path = "publish_test.rs"]
mod tests;
