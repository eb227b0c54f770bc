//! HTML views.

use askama::Template;

use crate::models::User;
use crate::quiz::QuizOutcome;

/// Titled block of text shown under the notes form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizPanel {
    pub title: String,
    pub content: String,
}

impl QuizPanel {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            content: message.into(),
        }
    }
}

impl From<QuizOutcome> for QuizPanel {
    fn from(outcome: QuizOutcome) -> Self {
        match outcome {
            QuizOutcome::InsufficientTokens { .. } => QuizPanel::error("Not enough tokens!"),
            QuizOutcome::Generated { content, .. } => QuizPanel {
                title: "Generated Quiz".to_string(),
                content,
            },
            QuizOutcome::Failed { message, .. } => QuizPanel {
                title: "Quiz Generation Failed".to_string(),
                content: message,
            },
        }
    }
}

/// Landing page, dashboard and quiz result share one template.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub user: Option<User>,
    pub quiz: Option<QuizPanel>,
    pub default_num_questions: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("Template rendering failed: {0}")]
pub struct ViewError(#[from] askama::Error);

impl IndexPage {
    pub fn render_html(&self) -> Result<String, ViewError> {
        Ok(self.render()?)
    }
}
