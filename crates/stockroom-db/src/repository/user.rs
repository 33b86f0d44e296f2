//! # User Repository
//!
//! Persistence for login accounts. Users are created at registration and
//! read at login; this repository never updates or deletes them.
//!
//! The `password` column only ever receives an already-hashed PHC string.
//! Emails are compared case-insensitively (`COLLATE NOCASE`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{User, UserId};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    ///
    /// ## Arguments
    /// * `email` - Already validated and normalized
    /// * `password_hash` - PHC-format hash, never plaintext
    ///
    /// ## Returns
    /// * `Ok(User)` - Stored user with its generated id
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, email: &str, password_hash: &str) -> DbResult<User> {
        debug!(email = %email, "Inserting user");

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, email, password AS password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("email", email)),
                other => Err(other),
            },
        }
    }

    /// Looks up a user by email.
    ///
    /// Absence is not an error here: login turns it into the same failure as
    /// a wrong password.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password AS password_hash, created_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: UserId) -> DbResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password AS password_hash, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("User", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
