use std::sync::Arc;
use axum::{extract::State, response::Html, routing::get, Router};

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::Result;
use crate::views::IndexPage;
use crate::AppState;

/// GET / - Landing page
async fn index(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>> {
    let page = IndexPage {
        user,
        quiz: None,
        default_num_questions: state.config.quiz.default_num_questions,
    };
    Ok(Html(page.render_html()?))
}

/// GET /dashboard - Signed-in landing page
async fn dashboard(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let page = IndexPage {
        user: Some(user),
        quiz: None,
        default_num_questions: state.config.quiz.default_num_questions,
    };
    Ok(Html(page.render_html()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/dashboard", get(dashboard))
}
