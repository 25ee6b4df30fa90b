//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON API consumed by the terminal client: AI generation, publishing,
//! the community gallery and load-from-link. Handlers translate between HTTP
//! and the service layer; every failure renders as an [`ApiError`](crate::error::ApiError).

pub mod ai;
pub mod gallery;
pub mod publish;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ai", post(ai::generate))
        .route("/api/publish", post(publish::publish))
        .route("/api/gallery", get(gallery::list))
        .route("/api/artwork/{id}/grid", get(gallery::artwork_grid))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
