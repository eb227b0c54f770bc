//! Google sign-in and browser sessions.

mod google;
mod session;
mod state;

pub use google::{GoogleOAuthClient, GoogleProfile, VerifiedIdentity};
pub use session::{clear_cookie, cookie_value, set_cookie, CurrentUser, MaybeUser, OAUTH_STATE_COOKIE};
pub use state::{StateSigner, STATE_TTL_SECS};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization denied: {0}")]
    Denied(String),
    #[error("Missing authorization code")]
    MissingCode,
    #[error("OAuth state does not match")]
    StateMismatch,
    #[error("Invalid OAuth state: {0}")]
    InvalidState(String),
    #[error("Invalid OAuth endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),
    #[error("Email address is not verified")]
    UnverifiedEmail,
    #[error("Profile is missing field: {0}")]
    MissingProfileField(&'static str),
}
