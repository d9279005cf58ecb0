//! Identity service — resolve a caller token to a user id.
//!
//! Authentication itself lives with an external provider. The relay only asks
//! "who is this token?" and treats any unresolved answer as anonymous.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const VERIFY_TIMEOUT_SECS: u64 = 10;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity config parse failed: {0}")]
    ConfigParse(String),
    #[error("identity provider request failed: {0}")]
    Request(String),
    #[error("identity provider returned status {0}")]
    Status(u16),
    #[error("identity provider response invalid: {0}")]
    Parse(String),
}

impl IdentityError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_IDENTITY_CONFIG",
            Self::Request(_) => "E_IDENTITY_REQUEST",
            Self::Status(_) => "E_IDENTITY_STATUS",
            Self::Parse(_) => "E_IDENTITY_PARSE",
        }
    }
}

/// Async token resolver. Enables mocking in tests.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve `token` to an identity. `Ok(None)` means the token is unknown.
    ///
    /// # Errors
    ///
    /// Returns an [`IdentityError`] when the provider cannot answer.
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError>;
}

/// Build the identity provider from environment variables.
///
/// - `AUTH_VERIFY_URL`: remote verification endpoint; wins when set
/// - `AUTH_TOKENS`: `token=user_id` list used otherwise
///
/// With neither set every request is anonymous.
///
/// # Errors
///
/// Returns an [`IdentityError`] if the configured value cannot be parsed.
pub fn provider_from_env() -> Result<Arc<dyn IdentityProvider>, IdentityError> {
    if let Some(url) = std::env::var("AUTH_VERIFY_URL").ok().filter(|u| !u.trim().is_empty()) {
        tracing::info!(%url, "using remote identity verification");
        return Ok(Arc::new(RemoteIdentity::new(url.trim())?));
    }
    let tokens = StaticTokens::parse(&std::env::var("AUTH_TOKENS").unwrap_or_default())?;
    if tokens.is_empty() {
        tracing::warn!("no AUTH_TOKENS or AUTH_VERIFY_URL configured; all relay requests will be unauthorized");
    } else {
        tracing::info!(count = tokens.len(), "using static identity tokens");
    }
    Ok(Arc::new(tokens))
}

// =============================================================================
// STATIC TOKENS
// =============================================================================

/// Fixed token table, loaded from `AUTH_TOKENS=token=user,token2=user2`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    /// Parse a `token=user_id` list separated by commas.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::ConfigParse`] for entries without `=` or with an
    /// empty side.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let mut tokens = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((token, user_id)) = entry.split_once('=') else {
                return Err(IdentityError::ConfigParse(format!("expected token=user_id, got '{entry}'")));
            };
            let (token, user_id) = (token.trim(), user_id.trim());
            if token.is_empty() || user_id.is_empty() {
                return Err(IdentityError::ConfigParse(format!("empty token or user id in '{entry}'")));
            }
            tokens.insert(token.to_owned(), user_id.to_owned());
        }
        Ok(Self { tokens })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticTokens {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(self
            .tokens
            .get(token)
            .map(|user_id| Identity { user_id: user_id.clone() }))
    }
}

// =============================================================================
// REMOTE VERIFICATION
// =============================================================================

/// Asks an external verification endpoint about each token.
///
/// `GET {verify_url}` with `Authorization: Bearer <token>`; a success status
/// with `{"user_id": "..."}` authenticates, `401`/`403` rejects.
pub struct RemoteIdentity {
    http: reqwest::Client,
    verify_url: String,
}

impl RemoteIdentity {
    /// # Errors
    ///
    /// Returns [`IdentityError::ConfigParse`] if the HTTP client cannot be built.
    pub fn new(verify_url: impl Into<String>) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(VERIFY_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentityError::ConfigParse(e.to_string()))?;
        Ok(Self { http, verify_url: verify_url.into() })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for RemoteIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, IdentityError> {
        let resp = self
            .http
            .get(&self.verify_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IdentityError::Status(status.as_u16()));
        }

        let identity = resp
            .json::<Identity>()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        if identity.user_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(identity))
    }
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
