//! Error types for request handlers.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::store::StoreError;
use crate::views::ViewError;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/login/google";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not signed in")]
    Unauthenticated,

    /// Bad form input. Carries the page already rendered with the message.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String, page: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] ViewError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            AppError::InvalidInput { page, .. } => {
                (StatusCode::BAD_REQUEST, Html(page)).into_response()
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Storage failure");
                internal_error()
            }
            AppError::Render(e) => {
                tracing::error!(error = %e, "Rendering failure");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html("<h1>500 Internal Server Error</h1><p>Something went wrong. Please try again.</p>"),
    ).into_response()
}

pub type Result<T> = std::result::Result<T, AppError>;
