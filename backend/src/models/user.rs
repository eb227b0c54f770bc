use chrono::{DateTime, Utc};
use serde::Serialize;

/// User record created on first successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Row ID, assigned by the store
    pub id: i64,
    /// Display name from the Google profile
    pub name: String,
    /// Email from the Google profile, unique per user
    pub email: String,
    /// Remaining question tokens
    pub tokens: i64,
    /// When the user first signed in
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the balance covers `requested` questions.
    pub fn can_afford(&self, requested: i64) -> bool {
        self.tokens >= requested
    }
}
