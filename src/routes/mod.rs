//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the relay endpoints under `/api` plus a health probe into a single
//! Axum router. CORS is permissive: callers authenticate with a bearer token,
//! not ambient cookies from this origin.

pub mod auth;
pub mod relay;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/conversation", post(relay::conversation))
        .route("/api/code", post(relay::code))
        .route("/api/image", post(relay::image))
        .route("/api/video", post(relay::video))
        .route("/api/music", post(relay::music))
        .route("/api/tools", get(relay::tools))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
