//! Token-metered quiz generation.

mod service;

pub use service::{build_prompt, QuizOutcome, QuizService};

use std::num::{IntErrorKind, ParseIntError};
use serde::Deserialize;

/// Form body posted to `/generate`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub num_questions: Option<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Number of questions must be a whole number, got {0:?}")]
    NotAnInteger(String),
    #[error("Number of questions must be at least 1")]
    NotPositive,
    #[error("Number of questions is out of range, got {0}")]
    OutOfRange(String),
}

/// Parse the requested question count. Missing or blank uses `default`.
pub fn parse_num_questions(raw: Option<&str>, default: i64) -> Result<i64, InputError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    let n: i64 = raw.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            InputError::OutOfRange(raw.to_string())
        }
        _ => InputError::NotAnInteger(raw.to_string()),
    })?;

    if n <= 0 {
        return Err(InputError::NotPositive);
    }
    Ok(n)
}
