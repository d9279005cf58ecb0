//! Relay routes — conversation, code, image and placeholder tools.
//!
//! Checks run in a fixed order so no provider call happens for a request that
//! would be rejected: identity, then payload, then provider credential. Every
//! failure is logged once under the endpoint's tag and answered as plain text.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use super::auth::AuthUser;
use crate::llm::types::Turn;
use crate::services::catalog::{self, TOOLS, ToolInfo};
use crate::services::image;
use crate::services::relay::{self, RelayError, RelayMode};
use crate::state::AppState;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/conversation` — relay the history as-is.
pub async fn conversation(
    State(state): State<AppState>,
    auth: Result<AuthUser, RelayError>,
    body: Bytes,
) -> Response {
    relay_response(&state, RelayMode::Conversation, auth, &body).await
}

/// `POST /api/code` — relay the history behind the code-only instruction.
pub async fn code(State(state): State<AppState>, auth: Result<AuthUser, RelayError>, body: Bytes) -> Response {
    relay_response(&state, RelayMode::Code, auth, &body).await
}

/// `POST /api/image` — generate images and return `[{ "url": ... }]`.
pub async fn image(State(state): State<AppState>, auth: Result<AuthUser, RelayError>, body: Bytes) -> Response {
    let result = async {
        let user = auth?;
        let request = image::parse_image_request(&body)?;
        let images = image::generate(state.llm(), &request).await?;
        tracing::info!(user_id = %user.identity.user_id, count = images.len(), "images generated");
        Ok::<_, RelayError>(images)
    }
    .await;

    match result {
        Ok(images) => Json(images).into_response(),
        Err(RelayError::InvalidPayload(detail)) => {
            tracing::warn!(tag = image::LOG_TAG, %detail, "rejected image request");
            (StatusCode::BAD_REQUEST, detail).into_response()
        }
        Err(e) => error_response(image::LOG_TAG, e),
    }
}

/// `GET /api/tools` — list dashboard tools and their availability.
pub async fn tools() -> Json<&'static [ToolInfo]> {
    Json(TOOLS)
}

/// `POST /api/video` — authenticated placeholder.
pub async fn video(auth: Result<AuthUser, RelayError>) -> Response {
    placeholder("video", auth)
}

/// `POST /api/music` — authenticated placeholder.
pub async fn music(auth: Result<AuthUser, RelayError>) -> Response {
    placeholder("music", auth)
}

// =============================================================================
// HELPERS
// =============================================================================

async fn relay_response(
    state: &AppState,
    mode: RelayMode,
    auth: Result<AuthUser, RelayError>,
    body: &[u8],
) -> Response {
    match run_relay(state, mode, auth, body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(mode.log_tag(), e),
    }
}

async fn run_relay(
    state: &AppState,
    mode: RelayMode,
    auth: Result<AuthUser, RelayError>,
    body: &[u8],
) -> Result<Turn, RelayError> {
    let user = auth?;
    let history = relay::parse_messages(body)?;
    let reply = relay::relay(state.llm(), mode, &history).await?;
    tracing::info!(user_id = %user.identity.user_id, ?mode, turns = history.len(), "relay reply");
    Ok(reply)
}

fn placeholder(key: &str, auth: Result<AuthUser, RelayError>) -> Response {
    if let Err(e) = auth {
        return e.into_response();
    }
    let label = catalog::find(key).map_or(key, |tool| tool.label);
    (StatusCode::NOT_IMPLEMENTED, format!("{label} is not available yet")).into_response()
}

/// Log a relay failure under `tag` and convert it to its HTTP response.
fn error_response(tag: &'static str, err: RelayError) -> Response {
    match &err {
        RelayError::Unauthorized | RelayError::InvalidPayload(_) => {
            tracing::warn!(tag, code = err.error_code(), error = %err, "relay request rejected");
        }
        RelayError::Misconfigured | RelayError::UpstreamRateLimited(_) | RelayError::UpstreamUnknown(_) => {
            tracing::error!(tag, code = err.error_code(), error = %err, "relay request failed");
        }
    }
    err.into_response()
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
