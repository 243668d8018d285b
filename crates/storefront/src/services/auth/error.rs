//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] thockshop_core::EmailError),

    /// Wrong password or unknown account; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration against an email that already has an account.
    #[error("already registered")]
    EmailTaken,

    /// Password failed the length policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Password appears in the breach corpus.
    #[error("this password has appeared in a data breach, choose another")]
    BreachedPassword,

    /// The account exists but is disabled.
    #[error("this account is disabled")]
    AccountDisabled,

    /// An account with this email already exists under another provider.
    /// Carries the provider name for the error redirect; accounts are never
    /// silently linked.
    #[error("account already exists via {existing}")]
    ProviderConflict { existing: String },

    /// The OAuth provider did not supply an email to key the account on.
    #[error("provider did not supply an email address")]
    OAuthEmailMissing,

    /// Password reset token is unknown, expired or already used.
    #[error("this reset link is invalid or has expired")]
    InvalidResetToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
