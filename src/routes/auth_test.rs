use super::*;
use crate::state::test_helpers::{TEST_TOKEN, TEST_USER, test_app_state_unconfigured};
use axum::http::Request;

fn parts_with(header: Option<(&str, &str)>) -> Parts {
    let mut builder = Request::builder().uri("/api/conversation");
    if let Some((name, value)) = header {
        builder = builder.header(name, value);
    }
    builder.body(()).unwrap().into_parts().0
}

// =============================================================================
// caller_token
// =============================================================================

#[test]
fn token_from_bearer_header() {
    let parts = parts_with(Some(("authorization", "Bearer abc")));
    assert_eq!(caller_token(&parts).as_deref(), Some("abc"));
}

#[test]
fn token_from_session_cookie() {
    let parts = parts_with(Some(("cookie", "theme=dark; __session=xyz")));
    assert_eq!(caller_token(&parts).as_deref(), Some("xyz"));
}

#[test]
fn blank_bearer_is_absent() {
    let parts = parts_with(Some(("authorization", "Bearer   ")));
    assert_eq!(caller_token(&parts), None);
}

#[test]
fn non_bearer_scheme_is_ignored() {
    let parts = parts_with(Some(("authorization", "Basic dXNlcjpwYXNz")));
    assert_eq!(caller_token(&parts), None);
}

#[test]
fn no_credentials_is_absent() {
    assert_eq!(caller_token(&parts_with(None)), None);
}

// =============================================================================
// AuthUser extractor
// =============================================================================

#[tokio::test]
async fn extractor_resolves_known_token() {
    let state = test_app_state_unconfigured();
    let bearer = format!("Bearer {TEST_TOKEN}");
    let mut parts = parts_with(Some(("authorization", &bearer)));

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.identity.user_id, TEST_USER);
}

#[tokio::test]
async fn extractor_rejects_unknown_token() {
    let state = test_app_state_unconfigured();
    let mut parts = parts_with(Some(("authorization", "Bearer wrong")));

    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();
    assert!(matches!(err, RelayError::Unauthorized));
}

#[tokio::test]
async fn extractor_rejects_missing_token() {
    let state = test_app_state_unconfigured();
    let mut parts = parts_with(None);

    assert!(AuthUser::from_request_parts(&mut parts, &state).await.is_err());
}
