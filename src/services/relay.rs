//! Completion relay — validate a caller's history and forward it upstream.
//!
//! DESIGN
//! ======
//! The relay is a pure request/response function: it holds no state between
//! calls and attempts exactly one upstream call per request. Mode selects the
//! optional system instruction; the caller's turns are forwarded in order and
//! never modified.

use axum::http::StatusCode;
use serde_json::Value;

use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Turn};

/// System instruction prepended to every code-generation request.
pub const CODE_INSTRUCTION: &str = "You are a code generator. You will be given a prompt and you will generate \
the code for that prompt. You will only respond with the code and nothing else. Use code comments for \
explanation of the code.";

/// User-facing message for an upstream rate limit or exhausted quota.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit or quota exceeded";

// =============================================================================
// MODE
// =============================================================================

/// Which relay endpoint is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    Conversation,
    Code,
}

impl RelayMode {
    /// Fixed system turn for this mode, if any.
    #[must_use]
    pub fn system_turn(self) -> Option<Turn> {
        match self {
            Self::Conversation => None,
            Self::Code => Some(Turn::system(CODE_INSTRUCTION)),
        }
    }

    /// Tag attached to every logged failure for this mode.
    #[must_use]
    pub fn log_tag(self) -> &'static str {
        match self {
            Self::Conversation => "[CONVERSATION_ERROR]",
            Self::Code => "[CODE_ERROR]",
        }
    }

    /// Route path serving this mode.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Conversation => "/api/conversation",
            Self::Code => "/api/code",
        }
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// Failure taxonomy shared by every relay endpoint.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("no caller identity")]
    Unauthorized,

    #[error("provider credential not configured")]
    Misconfigured,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("upstream rate limited: {0}")]
    UpstreamRateLimited(LlmError),

    #[error("upstream failure: {0}")]
    UpstreamUnknown(LlmError),
}

impl RelayError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Misconfigured | Self::UpstreamUnknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text response body. Upstream details never leak to callers.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::Misconfigured => "OpenAI API Key not configured",
            Self::InvalidPayload(_) => "Messages are required",
            Self::UpstreamRateLimited(_) => RATE_LIMIT_MESSAGE,
            Self::UpstreamUnknown(_) => "Internal Server Error",
        }
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Misconfigured => "E_MISCONFIGURED",
            Self::InvalidPayload(_) => "E_INVALID_PAYLOAD",
            Self::UpstreamRateLimited(_) => "E_UPSTREAM_RATE_LIMITED",
            Self::UpstreamUnknown(_) => "E_UPSTREAM_UNKNOWN",
        }
    }
}

impl From<LlmError> for RelayError {
    fn from(err: LlmError) -> Self {
        if err.is_rate_limited() {
            Self::UpstreamRateLimited(err)
        } else {
            Self::UpstreamUnknown(err)
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Parse and validate a request body of the form `{ "messages": Turn[] }`.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] when the body is not JSON, the
/// `messages` field is missing, not an array, empty, or holds a malformed turn.
pub fn parse_messages(body: &[u8]) -> Result<Vec<Turn>, RelayError> {
    let root: Value =
        serde_json::from_slice(body).map_err(|e| RelayError::InvalidPayload(format!("body is not JSON: {e}")))?;
    let Some(raw) = root.get("messages") else {
        return Err(RelayError::InvalidPayload("messages field missing".into()));
    };
    let Some(items) = raw.as_array() else {
        return Err(RelayError::InvalidPayload("messages is not an array".into()));
    };
    if items.is_empty() {
        return Err(RelayError::InvalidPayload("messages is empty".into()));
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let turn = serde_json::from_value::<Turn>(item.clone())
                .map_err(|e| RelayError::InvalidPayload(format!("messages[{index}]: {e}")))?;
            if turn.content.is_empty() {
                return Err(RelayError::InvalidPayload(format!("messages[{index}]: empty content")));
            }
            Ok(turn)
        })
        .collect()
}

// =============================================================================
// RELAY
// =============================================================================

/// Forward `history` to the provider and return its single reply.
///
/// `llm` is `None` when no provider credential is configured.
///
/// # Errors
///
/// Returns [`RelayError::Misconfigured`] without a provider, otherwise the
/// classified upstream failure.
pub async fn relay(llm: Option<&dyn LlmChat>, mode: RelayMode, history: &[Turn]) -> Result<Turn, RelayError> {
    let Some(llm) = llm else {
        return Err(RelayError::Misconfigured);
    };

    let mut outbound = Vec::with_capacity(history.len() + 1);
    outbound.extend(mode.system_turn());
    outbound.extend_from_slice(history);

    tracing::debug!(?mode, turns = outbound.len(), "relaying to provider");
    let reply = llm.chat(&outbound).await?;
    Ok(reply)
}

#[cfg(test)]
#[path = "relay_test.rs"]
mod tests;
