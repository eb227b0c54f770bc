use reqwest::{Client, Url};
use serde::Deserialize;

use super::AuthError;
use crate::config::Config;

/// Profile fields returned by Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub verified_email: Option<bool>,
}

/// Identity taken from a profile once its required fields are checked.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
}

impl GoogleProfile {
    /// Require a non-empty, verified email and a display name.
    pub fn into_identity(self) -> Result<VerifiedIdentity, AuthError> {
        if self.verified_email == Some(false) {
            return Err(AuthError::UnverifiedEmail);
        }

        let email = self.email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthError::MissingProfileField("email"))?;
        let name = self.name
            .filter(|n| !n.trim().is_empty())
            .ok_or(AuthError::MissingProfileField("name"))?;

        Ok(VerifiedIdentity { email, name })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for Google's OAuth 2.0 authorization-code flow.
pub struct GoogleOAuthClient {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    scopes: String,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: Client::new(),
            client_id: config.google.client_id.clone(),
            client_secret: config.google.client_secret.clone(),
            redirect_url: config.oauth_redirect_url(),
            auth_url: config.google.auth_url.clone(),
            token_url: config.google.token_url.clone(),
            userinfo_url: config.google.userinfo_url.clone(),
            scopes: config.google.scopes.clone(),
        }
    }

    /// Build the consent-screen URL the browser is redirected to.
    pub fn authorize_url(&self, state: &str) -> Result<Url, AuthError> {
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("scope", self.scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::InvalidEndpoint(e.to_string()))
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        tracing::debug!("Exchanging authorization code at {}", self.token_url);

        let response = self.http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Fetch the signed-in user's profile.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AuthError> {
        let response = self.http_client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::ProfileFetch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ProfileFetch(format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ProfileFetch(e.to_string()))
    }
}
