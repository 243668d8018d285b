//! Password reset token repository.
//!
//! Reset tokens reuse the session-token scheme: a random client-held secret
//! whose SHA-256 hash is the stored key. Tokens are single-use and expire
//! after one hour.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use thockshop_core::UserId;

use super::RepositoryError;
use super::sessions::hash_session_token;

/// How long a reset token stays redeemable.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Repository for password reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ResetRow {
    user_id: UserId,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, token: &str, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_tokens (token_hash, user_id, expires_at) \
             VALUES ($1, $2, $3)",
        )
        .bind(hash_session_token(token))
        .bind(user_id)
        .bind(Utc::now() + RESET_TOKEN_TTL)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Redeem a token: returns the owning user and marks the token used.
    ///
    /// Returns `None` for unknown, expired or already-used tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn redeem(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let token_hash = hash_session_token(token);

        let row: Option<ResetRow> = sqlx::query_as(
            "SELECT user_id, expires_at, used_at \
             FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(&token_hash)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        if row.used_at.is_some() || Utc::now() >= row.expires_at {
            return Ok(None);
        }

        sqlx::query("UPDATE password_reset_tokens SET used_at = now() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(self.pool)
            .await?;

        Ok(Some(row.user_id))
    }
}
