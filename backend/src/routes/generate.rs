use std::sync::Arc;
use axum::{
    extract::State,
    response::Html,
    routing::post,
    Form, Router,
};

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::User;
use crate::quiz::{parse_num_questions, GenerateForm};
use crate::views::{IndexPage, QuizPanel};
use crate::AppState;

/// POST /generate - Turn notes into a quiz, paying one token per question
async fn generate(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>> {
    let default_num_questions = state.config.quiz.default_num_questions;

    let num_questions = match parse_num_questions(form.num_questions.as_deref(), default_num_questions) {
        Ok(n) => n,
        Err(e) => {
            let message = e.to_string();
            let page = IndexPage {
                user: Some(user),
                quiz: Some(QuizPanel::error(message.clone())),
                default_num_questions,
            }.render_html()?;
            return Err(AppError::InvalidInput { message, page });
        }
    };

    let outcome = state.quiz_service
        .request_quiz(&state.store, &user, &form.notes, num_questions)
        .await?;

    let user = User { tokens: outcome.balance(), ..user };
    let page = IndexPage {
        user: Some(user),
        quiz: Some(outcome.into()),
        default_num_questions,
    };

    Ok(Html(page.render_html()?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/generate", post(generate))
}
