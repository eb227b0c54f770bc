pub mod auth;
pub mod generate;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(auth::router())
        .merge(generate::router())
        .with_state(state)
        .merge(health::router())
}
