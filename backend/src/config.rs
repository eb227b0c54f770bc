//! Configuration for the QuizGen backend.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub google: GoogleConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally visible base URL, used to build the OAuth redirect URI.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite path, optionally prefixed with `sqlite:`. `:memory:` is accepted.
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign OAuth state tokens.
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Mark cookies `Secure` (enable behind HTTPS).
    #[serde(default)]
    pub secure: bool,
}

/// Google OAuth 2.0 client settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_google_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_google_scopes")]
    pub scopes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfig {
    /// Token balance granted to a newly created user.
    #[serde(default = "default_initial_tokens")]
    pub initial_tokens: i64,
    /// Question count used when the form omits `num_questions`.
    #[serde(default = "default_num_questions")]
    pub default_num_questions: i64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            initial_tokens: default_initial_tokens(),
            default_num_questions: default_num_questions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_database_url() -> String {
    "sqlite:./data/users.db".to_string()
}
fn default_cookie_name() -> String {
    "quizgen_session".to_string()
}
fn default_session_ttl() -> u64 {
    7 * 24 * 60 * 60
}
fn default_google_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}
fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}
fn default_google_userinfo_url() -> String {
    "https://www.googleapis.com/oauth2/v2/userinfo".to_string()
}
fn default_google_scopes() -> String {
    "openid email profile".to_string()
}
fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_initial_tokens() -> i64 {
    100
}
fn default_num_questions() -> i64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Flat environment variables accepted alongside the `QUIZGEN__` scheme.
/// Later entries win when two name the same key.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("FLASK_SECRET_KEY", "session.secret"),
    ("SESSION_SECRET", "session.secret"),
    ("GEMINI_API_KEY", "gemini.api_key"),
    ("GEMINI_MODEL", "gemini.model"),
    ("GOOGLE_CLIENT_ID", "google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "google.client_secret"),
    ("DATABASE_URL", "database.url"),
    ("PORT", "server.port"),
];

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// A `.env` file in the working directory is read into the process
    /// environment first; variables already set are left alone.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Flat variables such as `GEMINI_API_KEY` or `GOOGLE_CLIENT_ID`
    /// 2. Environment variables (QUIZGEN__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Same as [`Config::load`] without reading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("QUIZGEN")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_KEYS {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Redirect URI registered with Google for the callback route.
    pub fn oauth_redirect_url(&self) -> String {
        format!("{}/auth/callback", self.server.public_url.trim_end_matches('/'))
    }
}
