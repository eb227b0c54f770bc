//! Helpers shared by unit and integration tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use crate::config::{
    Config, DatabaseConfig, GeminiConfig, GoogleConfig, LoggingConfig, QuizConfig, ServerConfig,
    SessionConfig,
};
use crate::llm::{LlmError, TextGenerator};
use crate::models::User;
use crate::store::UserStore;
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
        },
        database: DatabaseConfig {
            url: ":memory:".to_string(),
        },
        session: SessionConfig {
            secret: "test-secret".to_string(),
            cookie_name: "quizgen_session".to_string(),
            ttl_secs: 3600,
            secure: false,
        },
        google: GoogleConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            auth_url: "https://accounts.example.com/auth".to_string(),
            token_url: "http://127.0.0.1:9/token".to_string(),
            userinfo_url: "http://127.0.0.1:9/userinfo".to_string(),
            scopes: "openid email profile".to_string(),
        },
        gemini: GeminiConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        quiz: QuizConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

/// A `TextGenerator` that returns a canned reply and records every prompt.
pub struct StubGenerator {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.reply.clone().map_err(LlmError::Api)
    }
}

/// Application state over an in-memory store.
pub fn create_test_state(config: Config, generator: Arc<dyn TextGenerator>) -> Arc<AppState> {
    let store = Arc::new(UserStore::new(&config.database.url).expect("in-memory store"));
    Arc::new(AppState::new(config, store, generator))
}

/// Create a user with `tokens` and a live session. Returns the user and a `Cookie` header value.
pub fn sign_in(state: &AppState, name: &str, email: &str, tokens: i64) -> (User, String) {
    let user = state.store
        .find_or_create_user(name, email, tokens)
        .expect("create user");
    let token = state.store
        .create_session(user.id, Duration::from_secs(3600))
        .expect("create session");
    let cookie = format!("{}={}", state.config.session.cookie_name, token);
    (user, cookie)
}
