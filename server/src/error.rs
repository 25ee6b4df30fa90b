//! Error codes and their HTTP rendering.
//!
//! Every service error implements [`ErrorCode`], which gives it a stable,
//! grepable code (`E_...`) and says whether retrying could help. Route
//! handlers convert errors into [`ApiError`], which renders as
//! `{ "error": ..., "code": ..., "retryable": ... }` with a status code.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured error metadata shared by all service errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// An error ready to be sent to an HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
    pub retryable: bool,
}

impl ApiError {
    /// Wrap a service error, using its `Display` text as the message.
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, error: err.to_string(), code: err.error_code(), retryable: err.retryable() }
    }

    /// Wrap a service error behind a fixed public message. The detailed
    /// error stays in the server log.
    pub fn with_message(status: StatusCode, message: &str, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, error: message.to_string(), code: err.error_code(), retryable: err.retryable() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// =============================================================================
// JSON BODIES
// =============================================================================

/// A request body axum could not decode into the handler's type.
#[derive(Debug, thiserror::Error)]
#[error("invalid request body: {0}")]
pub struct BodyError(String);

impl ErrorCode for BodyError {
    fn error_code(&self) -> &'static str {
        "E_INVALID_BODY"
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), &BodyError(rejection.body_text()))
    }
}

/// `Json` extractor whose rejections render as [`ApiError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
