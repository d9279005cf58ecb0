//! Caller identity extraction.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::services::identity::Identity;
use crate::services::relay::RelayError;
use crate::state::AppState;

/// Session cookie set by the hosted auth provider's browser SDK.
pub const SESSION_COOKIE_NAME: &str = "__session";

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated caller. Use as a handler parameter to require an identity,
/// or as `Result<AuthUser, RelayError>` to handle rejection in the handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RelayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = caller_token(parts) else {
            return Err(RelayError::Unauthorized);
        };

        let app_state = AppState::from_ref(state);
        match app_state.identity.resolve(&token).await {
            Ok(Some(identity)) => Ok(Self { identity }),
            Ok(None) => Err(RelayError::Unauthorized),
            Err(e) => {
                tracing::warn!(error = %e, error_code = e.error_code(), "identity resolution failed; treating caller as anonymous");
                Err(RelayError::Unauthorized)
            }
        }
    }
}

/// Pull the caller token from `Authorization: Bearer` or the session cookie.
pub(crate) fn caller_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(SESSION_COOKIE_NAME)
        .map(Cookie::value)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
