//! Relay client — how a chat session reaches the relay endpoints.
//!
//! ERROR HANDLING
//! ==============
//! Callers get a typed [`RelayCallError`]; the session maps it to a single
//! user-facing string and never propagates it further.

use std::time::Duration;

use crate::llm::types::Turn;
use crate::services::relay::RelayMode;

const CLIENT_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, thiserror::Error)]
pub enum RelayCallError {
    #[error("relay request failed: {0}")]
    Transport(String),
    #[error("relay returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("relay reply could not be decoded: {0}")]
    Decode(String),
}

impl RelayCallError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_RELAY_TRANSPORT",
            Self::Status { .. } => "E_RELAY_STATUS",
            Self::Decode(_) => "E_RELAY_DECODE",
        }
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }
}

/// Sends a transcript to the relay. Enables mocking in tests.
#[async_trait::async_trait]
pub trait RelayClient: Send + Sync {
    /// Post `history` to the endpoint for `mode` and return the reply turn.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayCallError`] for transport, status or decode failures.
    async fn send(&self, mode: RelayMode, history: &[Turn]) -> Result<Turn, RelayCallError>;
}

/// HTTP implementation against a running relay server.
pub struct HttpRelayClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRelayClient {
    /// # Errors
    ///
    /// Returns [`RelayCallError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RelayCallError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(|e| RelayCallError::Transport(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), token })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `path` and return the raw success body.
    ///
    /// # Errors
    ///
    /// Returns a [`RelayCallError`] for transport failures or non-success status.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, RelayCallError> {
        let mut request = self.http.post(format!("{}{}", self.base_url, path)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RelayCallError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RelayCallError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(RelayCallError::Status { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(&self, mode: RelayMode, history: &[Turn]) -> Result<Turn, RelayCallError> {
        let body = serde_json::json!({ "messages": history });
        let text = self.post_json(mode.path(), &body).await?;
        serde_json::from_str::<Turn>(&text).map_err(|e| RelayCallError::Decode(e.to_string()))
    }
}
