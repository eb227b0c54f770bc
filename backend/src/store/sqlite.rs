use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use sha2::{Digest, Sha256};

use crate::models::user::User;

/// SQLite-backed store for users and their browser sessions.
pub struct UserStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(i64),
}

fn db_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::DatabaseError(e.to_string())
}

const USER_COLUMNS: &str = "users.id, users.name, users.email, users.tokens, users.created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        tokens: row.get(3)?,
        created_at: created_at.with_timezone(&Utc),
    })
}

/// Fixed-width UTC timestamp so stored values compare correctly as text.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SHA-256 of a raw session token; only the digest is persisted.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl UserStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        // Parse sqlite: prefix if present
        let path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        let conn = if path == ":memory:" {
            Connection::open_in_memory().map_err(db_err)?
        } else {
            // Create parent directories if needed
            if let Some(parent) = Path::new(path).parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::IoError(e.to_string()))?;
            }
            Connection::open(path).map_err(db_err)?
        };

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                tokens INTEGER NOT NULL DEFAULT 100 CHECK (tokens >= 0),
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);",
        ).map_err(db_err)?;

        tracing::info!("User store initialized with database: {}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Find a user by email or create one with `initial_tokens`.
    ///
    /// An existing user keeps its name and balance.
    pub fn find_or_create_user(
        &self,
        name: &str,
        email: &str,
        initial_tokens: i64,
    ) -> Result<User, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        let inserted = conn.execute(
            "INSERT INTO users (name, email, tokens, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(email) DO NOTHING",
            params![name, email, initial_tokens, timestamp(Utc::now())],
        ).map_err(db_err)?;

        let user = conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        ).map_err(db_err)?;

        if inserted > 0 {
            tracing::info!(user_id = user.id, email = %user.email, tokens = user.tokens, "Created new user");
        }

        Ok(user)
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            user_from_row,
        ).optional().map_err(db_err)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        ).optional().map_err(db_err)
    }

    pub fn count_users(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(db_err)
    }

    /// Debit `amount` tokens if the balance covers it.
    ///
    /// Returns the new balance, or `None` when the balance is too low (no
    /// change is made). The check and the write are one statement, so
    /// concurrent debits can never drive the balance below zero.
    pub fn debit_tokens(&self, user_id: i64, amount: i64) -> Result<Option<i64>, StoreError> {
        if amount < 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let conn = self.conn.lock().map_err(db_err)?;

        let balance = conn.query_row(
            "UPDATE users SET tokens = tokens - ?1 WHERE id = ?2 AND tokens >= ?1 RETURNING tokens",
            params![amount, user_id],
            |row| row.get::<_, i64>(0),
        ).optional().map_err(db_err)?;

        match balance {
            Some(left) => tracing::info!(user_id, debited = amount, tokens = left, "Debited tokens"),
            None => tracing::debug!(user_id, requested = amount, "Debit refused"),
        }

        Ok(balance)
    }

    /// Start a session for `user_id`. Returns the raw token for the cookie.
    pub fn create_session(&self, user_id: i64, ttl: Duration) -> Result<String, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        let token = new_session_token();
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StoreError::DatabaseError(format!("session ttl out of range: {}", e)))?;

        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![hash_token(&token), user_id, timestamp(now), timestamp(now + ttl)],
        ).map_err(db_err)?;

        tracing::debug!(user_id, "Created session");
        Ok(token)
    }

    /// Resolve a raw session token to its user. Expired sessions resolve to `None`.
    pub fn user_for_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        conn.query_row(
            &format!(
                "SELECT {USER_COLUMNS} FROM sessions
                 JOIN users ON users.id = sessions.user_id
                 WHERE sessions.token_hash = ?1 AND sessions.expires_at > ?2"
            ),
            params![hash_token(token), timestamp(Utc::now())],
            user_from_row,
        ).optional().map_err(db_err)
    }

    /// Remove a session. Returns whether one existed.
    pub fn delete_session(&self, token: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        let removed = conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![hash_token(token)],
        ).map_err(db_err)?;

        Ok(removed > 0)
    }

    pub fn purge_expired_sessions(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock().map_err(db_err)?;

        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![timestamp(Utc::now())],
        ).map_err(db_err)?;

        if removed > 0 {
            tracing::debug!("Purged {} expired sessions", removed);
        }
        Ok(removed)
    }
}
