//! Google sign-in flow against mocked token and userinfo endpoints.

use quizgen_backend::test_util::{create_test_state, test_config, StubGenerator};
use quizgen_backend::{app, AppState};
use std::sync::Arc;
use axum::body::Body;
use http::header::{COOKIE, LOCATION, SET_COOKIE};
use http::{HeaderMap, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup(profile: serde_json::Value) -> (Arc<AppState>, MockServer) {
    setup_with_config(profile, test_config()).await
}

async fn setup_with_config(
    profile: serde_json::Value,
    mut config: quizgen_backend::Config,
) -> (Arc<AppState>, MockServer) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=good-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-123",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer access-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .mount(&server)
        .await;

    config.google.token_url = format!("{}/token", server.uri());
    config.google.userinfo_url = format!("{}/userinfo", server.uri());

    let state = create_test_state(config, Arc::new(StubGenerator::replying("Q")));
    (state, server)
}

fn ada_profile() -> serde_json::Value {
    json!({
        "id": "1234",
        "email": "ada@example.com",
        "verified_email": true,
        "name": "Ada Lovelace"
    })
}

async fn send(state: &Arc<AppState>, uri: &str, cookie: Option<&str>) -> (StatusCode, HeaderMap) {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let response = app(state.clone())
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    (response.status(), response.headers().clone())
}

/// `name=value` of the Set-Cookie header for `name`.
fn cookie_pair(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with(&format!("{}=", name)))
        .map(String::from)
}

/// Start a login and return (state param, state cookie).
async fn begin_login(state: &Arc<AppState>) -> (String, String) {
    let (status, headers) = send(state, "/login/google", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let location = headers.get(LOCATION).unwrap().to_str().unwrap();
    let url = reqwest::Url::parse(location).unwrap();
    assert!(location.starts_with("https://accounts.example.com/auth"));
    let oauth_state = url
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let cookie = cookie_pair(&headers, "quizgen_oauth_state").unwrap();
    (oauth_state, cookie)
}

/// Run the whole login flow; returns the session cookie on success.
async fn full_login(state: &Arc<AppState>) -> String {
    let (oauth_state, state_cookie) = begin_login(state).await;
    let uri = format!("/auth/callback?code=good-code&state={}", oauth_state);
    let (status, headers) = send(state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/dashboard");
    cookie_pair(&headers, "quizgen_session").unwrap()
}

#[tokio::test]
async fn test_first_login_creates_user_with_initial_tokens() {
    let (state, _server) = setup(ada_profile()).await;

    let session_cookie = full_login(&state).await;

    assert_eq!(state.store.count_users().unwrap(), 1);
    let user = state.store.find_user_by_email("ada@example.com").unwrap().unwrap();
    assert_eq!(user.tokens, 100);
    assert_eq!(user.name, "Ada Lovelace");

    let (status, _) = send(&state, "/dashboard", Some(&session_cookie)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_repeat_login_reuses_user_and_balance() {
    let (state, _server) = setup(ada_profile()).await;

    full_login(&state).await;
    let user = state.store.find_user_by_email("ada@example.com").unwrap().unwrap();
    state.store.debit_tokens(user.id, 35).unwrap();

    full_login(&state).await;

    assert_eq!(state.store.count_users().unwrap(), 1);
    let again = state.store.find_user_by_email("ada@example.com").unwrap().unwrap();
    assert_eq!(again.id, user.id);
    assert_eq!(again.tokens, 65);
}

#[tokio::test]
async fn test_denied_authorization_redirects_to_login() {
    let (state, _server) = setup(ada_profile()).await;
    let (oauth_state, state_cookie) = begin_login(&state).await;

    let uri = format!("/auth/callback?error=access_denied&state={}", oauth_state);
    let (status, headers) = send(&state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/login/google");
    assert!(cookie_pair(&headers, "quizgen_session").is_none());
    assert_eq!(state.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn test_state_mismatch_never_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.google.token_url = format!("{}/token", server.uri());
    let state = create_test_state(config, Arc::new(StubGenerator::replying("Q")));

    let (_, state_cookie) = begin_login(&state).await;
    let (other_state, _) = begin_login(&state).await;

    let uri = format!("/auth/callback?code=good-code&state={}", other_state);
    let (status, headers) = send(&state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/login/google");
    assert_eq!(state.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn test_callback_without_state_cookie_is_rejected() {
    let (state, _server) = setup(ada_profile()).await;
    let (oauth_state, _) = begin_login(&state).await;

    let uri = format!("/auth/callback?code=good-code&state={}", oauth_state);
    let (status, headers) = send(&state, &uri, None).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/login/google");
    assert_eq!(state.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn test_profile_without_name_redirects_to_login() {
    let (state, _server) = setup(json!({
        "email": "ada@example.com",
        "verified_email": true
    })).await;
    let (oauth_state, state_cookie) = begin_login(&state).await;

    let uri = format!("/auth/callback?code=good-code&state={}", oauth_state);
    let (status, headers) = send(&state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/login/google");
    assert_eq!(state.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_token_exchange_redirects_to_login() {
    let (state, _server) = setup(ada_profile()).await;
    let (oauth_state, state_cookie) = begin_login(&state).await;

    let uri = format!("/auth/callback?code=bad-code&state={}", oauth_state);
    let (status, headers) = send(&state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(LOCATION).unwrap(), "/login/google");
    assert_eq!(state.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn test_storage_failure_on_callback_still_clears_state_cookie() {
    // A negative starting balance violates the tokens CHECK constraint.
    let mut config = test_config();
    config.quiz.initial_tokens = -1;
    let (state, _server) = setup_with_config(ada_profile(), config).await;
    let (oauth_state, state_cookie) = begin_login(&state).await;

    let uri = format!("/auth/callback?code=good-code&state={}", oauth_state);
    let (status, headers) = send(&state, &uri, Some(&state_cookie)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(cookie_pair(&headers, "quizgen_oauth_state").unwrap(), "quizgen_oauth_state=");
    assert!(cookie_pair(&headers, "quizgen_session").is_none());
    assert_eq!(state.store.count_users().unwrap(), 0);
}
