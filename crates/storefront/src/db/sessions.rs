//! Session repository.
//!
//! Sessions are opaque random tokens held by the client; only the SHA-256
//! hash of a token is stored. Validation applies a sliding expiry: a session
//! used within the renewal window gets its expiry pushed back out, so
//! validating a token is a potential write and callers must not treat it as
//! idempotent.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use thockshop_core::UserId;

use super::RepositoryError;
use crate::models::session::Session;

/// How long a fresh or renewed session lives.
pub const SESSION_TTL: Duration = Duration::days(30);

/// Sessions used within this window of their expiry are renewed.
pub const RENEWAL_WINDOW: Duration = Duration::days(15);

/// Generate a new session token: 32 random bytes, URL-safe base64.
///
/// The token is the client-held secret; hand it to the cookie and forget it.
#[must_use]
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The stored key for a token: lowercase hex SHA-256.
#[must_use]
pub fn hash_session_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Whether a session seen at `now` should have its expiry pushed back.
#[must_use]
pub fn renewal_due(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    expires_at - now < RENEWAL_WINDOW
}

/// Database row shape for `sessions`.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    token_hash: String,
    user_id: UserId,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            token_hash: row.token_hash,
            user_id: row.user_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new session for `token`, expiring [`SESSION_TTL`] from now.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, token: &str, user_id: UserId) -> Result<Session, RepositoryError> {
        let row: SessionRow = sqlx::query_as(
            "INSERT INTO sessions (token_hash, user_id, expires_at) \
             VALUES ($1, $2, $3) \
             RETURNING token_hash, user_id, expires_at, created_at",
        )
        .bind(hash_session_token(token))
        .bind(user_id)
        .bind(Utc::now() + SESSION_TTL)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Validate a session token.
    ///
    /// Returns `None` for unknown tokens. An expired row is deleted on sight
    /// and reported as no session. A session inside the renewal window has
    /// its expiry extended to now + [`SESSION_TTL`] before being returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn validate(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let token_hash = hash_session_token(token);

        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT token_hash, user_id, expires_at, created_at \
             FROM sessions WHERE token_hash = $1",
        )
        .bind(&token_hash)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let now = Utc::now();
        if now >= row.expires_at {
            sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
                .bind(&token_hash)
                .execute(self.pool)
                .await?;
            return Ok(None);
        }

        let mut session: Session = row.into();
        if renewal_due(now, session.expires_at) {
            let renewed: SessionRow = sqlx::query_as(
                "UPDATE sessions SET expires_at = $2 WHERE token_hash = $1 \
                 RETURNING token_hash, user_id, expires_at, created_at",
            )
            .bind(&token_hash)
            .bind(now + SESSION_TTL)
            .fetch_one(self.pool)
            .await?;
            session = renewed.into();
        }

        Ok(Some(session))
    }

    /// Revoke a single session (logout).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn invalidate(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_session_token(token))
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Revoke every session belonging to a user (password change).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn invalidate_all_for_user(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_unpredictable_and_urlsafe() {
        let a = generate_session_token();
        let b = generate_session_token();
        assert_ne!(a, b);
        // 32 bytes of url-safe base64 without padding
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_hash_is_stable_and_one_way_shaped() {
        let token = "fixed-token";
        let hash = hash_session_token(token);
        assert_eq!(hash, hash_session_token(token));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, token);
    }

    #[test]
    fn test_renewal_window_boundaries() {
        let now = Utc::now();
        // Fresh session: 30 days out, no renewal
        assert!(!renewal_due(now, now + SESSION_TTL));
        // Inside the window: 14 days left
        assert!(renewal_due(now, now + Duration::days(14)));
        // Exactly on the boundary: 15 days left is not yet due
        assert!(!renewal_due(now, now + RENEWAL_WINDOW));
        // Nearly expired
        assert!(renewal_due(now, now + Duration::minutes(1)));
    }
}
