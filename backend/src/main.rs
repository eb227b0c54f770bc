use std::sync::Arc;
use tokio::net::TcpListener;

use quizgen_backend::{app, logging, AppState, Config, GeminiClient, UserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    logging::init(&config.logging.level);

    tracing::info!("Starting QuizGen");

    // Initialize components
    let store = Arc::new(UserStore::new(&config.database.url)?);
    let gemini = GeminiClient::new(&config.gemini.base_url, &config.gemini.api_key, &config.gemini.model);
    tracing::info!("Using Gemini model {}", gemini.model());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, store, Arc::new(gemini)));

    // Start server
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
