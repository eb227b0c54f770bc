use std::sync::Arc;
use std::time::Duration;
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::auth::{
    clear_cookie, cookie_value, set_cookie, AuthError, VerifiedIdentity, OAUTH_STATE_COOKIE,
    STATE_TTL_SECS,
};
use crate::error::{AppError, Result, LOGIN_PATH};
use crate::models::User;
use crate::store::StoreError;
use crate::AppState;

/// Query parameters Google appends to the callback URL.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// GET /login/google - Start the OAuth flow
async fn login(State(state): State<Arc<AppState>>) -> Response {
    let secure = state.config.session.secure;

    let redirect = state.state_signer
        .issue()
        .and_then(|oauth_state| {
            let url = state.google.authorize_url(&oauth_state)?;
            Ok((oauth_state, url))
        });

    match redirect {
        Ok((oauth_state, url)) => (
            AppendHeaders([(
                SET_COOKIE,
                set_cookie(OAUTH_STATE_COOKIE, &oauth_state, STATE_TTL_SECS as u64, secure),
            )]),
            Redirect::to(url.as_str()),
        ).into_response(),
        Err(e) => {
            tracing::error!("Could not start Google sign-in: {}", e);
            Redirect::to("/").into_response()
        }
    }
}

/// Validate the callback and fetch the signed-in identity from Google.
async fn complete_login(
    state: &AppState,
    headers: &HeaderMap,
    params: CallbackParams,
) -> std::result::Result<VerifiedIdentity, AuthError> {
    if let Some(error) = params.error {
        return Err(AuthError::Denied(error));
    }

    let returned_state = params.state.ok_or(AuthError::StateMismatch)?;
    let expected_state = cookie_value(headers, OAUTH_STATE_COOKIE);
    state.state_signer.verify(&returned_state, expected_state.as_deref())?;

    let code = params.code.filter(|c| !c.is_empty()).ok_or(AuthError::MissingCode)?;
    let access_token = state.google.exchange_code(&code).await?;
    state.google.fetch_profile(&access_token).await?.into_identity()
}

/// Find or create the user and open a session for them.
fn start_session(
    state: &AppState,
    identity: &VerifiedIdentity,
) -> std::result::Result<(User, String), StoreError> {
    let user = state.store.find_or_create_user(
        &identity.name,
        &identity.email,
        state.config.quiz.initial_tokens,
    )?;
    let ttl = Duration::from_secs(state.config.session.ttl_secs);
    let token = state.store.create_session(user.id, ttl)?;
    Ok((user, token))
}

/// GET /auth/callback - Finish the OAuth flow and start a session
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let session = &state.config.session;
    let clear_state = clear_cookie(OAUTH_STATE_COOKIE, session.secure);

    let identity = match complete_login(&state, &headers, params).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Google sign-in failed: {}", e);
            return (
                AppendHeaders([(SET_COOKIE, clear_state)]),
                Redirect::to(LOGIN_PATH),
            ).into_response();
        }
    };

    // The state cookie is spent either way.
    let (user, token) = match start_session(&state, &identity) {
        Ok(started) => started,
        Err(e) => {
            return (
                AppendHeaders([(SET_COOKIE, clear_state)]),
                AppError::from(e),
            ).into_response();
        }
    };
    if let Err(e) = state.store.purge_expired_sessions() {
        tracing::warn!("Failed to purge expired sessions: {}", e);
    }

    tracing::info!(user_id = user.id, email = %user.email, "User signed in");

    (
        AppendHeaders([
            (SET_COOKIE, set_cookie(&session.cookie_name, &token, session.ttl_secs, session.secure)),
            (SET_COOKIE, clear_state),
        ]),
        Redirect::to("/dashboard"),
    ).into_response()
}

/// GET /logout - End the session
async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Response> {
    let session = &state.config.session;

    if let Some(token) = cookie_value(&headers, &session.cookie_name) {
        if state.store.delete_session(&token)? {
            tracing::info!("User signed out");
        }
    }

    Ok((
        AppendHeaders([(SET_COOKIE, clear_cookie(&session.cookie_name, session.secure))]),
        Redirect::to("/"),
    ).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login/google", get(login))
        .route("/auth/callback", get(auth_callback))
        .route("/logout", get(logout))
}
