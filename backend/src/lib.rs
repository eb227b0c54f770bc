pub mod config;
pub mod error;
pub mod routes;
pub mod auth;
pub mod llm;
pub mod store;
pub mod models;
pub mod quiz;
pub mod views;
pub mod logging;
pub mod test_util;

pub use config::Config;
pub use auth::{CurrentUser, GoogleOAuthClient, StateSigner};
pub use error::AppError;
pub use llm::{GeminiClient, LlmError, TextGenerator};
pub use models::User;
pub use quiz::{QuizOutcome, QuizService};
pub use store::{StoreError, UserStore};

use std::sync::Arc;
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// User and session storage, passed explicitly to each handler.
    pub store: Arc<UserStore>,
    pub google: GoogleOAuthClient,
    /// Signs the OAuth `state` round-trip value.
    pub state_signer: StateSigner,
    pub quiz_service: QuizService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<UserStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            google: GoogleOAuthClient::new(&config),
            state_signer: StateSigner::new(&config.session.secret),
            quiz_service: QuizService::new(generator),
            store,
            config,
        }
    }
}

/// Build the full application with logging layers.
pub fn app(state: Arc<AppState>) -> Router {
    routes::router(state)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(TraceLayer::new_for_http())
}
