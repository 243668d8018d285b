//! User domain types.

use chrono::{DateTime, Utc};

use thockshop_core::{Email, OAuthProvider, UserId, UserStatus};

/// A storefront user.
///
/// Users come in two flavours that share one table: password accounts
/// (created through registration, `password_hash` present) and federated
/// accounts (created on first OAuth login, `identity` present). An account
/// never carries both a password and a federated identity unless the user
/// later sets a password explicitly.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address (unique across all providers).
    pub email: Email,
    /// Whether the email has been verified.
    pub email_verified: bool,
    /// Whether the user may use administrative tooling.
    pub is_admin: bool,
    /// Account status.
    pub status: UserStatus,
    /// Federated identity, if this account was created via OAuth.
    pub identity: Option<FederatedIdentity>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The `(provider, subject)` pair that keys a federated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Which OAuth provider vouches for this identity.
    pub provider: OAuthProvider,
    /// The provider's stable identifier for the user.
    pub subject: String,
}
