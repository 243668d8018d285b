//! Session domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thockshop_core::{Email, UserId};

/// A persisted login session.
///
/// The row is keyed by the SHA-256 hash of the client-held token; the raw
/// token never touches the database.
#[derive(Debug, Clone)]
pub struct Session {
    /// Hex-encoded SHA-256 of the session token.
    pub token_hash: String,
    /// Owner of the session.
    pub user_id: UserId,
    /// When the session stops being valid. Pushed forward on use within the
    /// renewal window (sliding expiry).
    pub expires_at: DateTime<Utc>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

/// The authenticated identity attached to a request.
///
/// Minimal projection of [`crate::models::User`] produced by session
/// validation; everything request handlers need without re-fetching the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Whether the user may use administrative tooling.
    pub is_admin: bool,
}
