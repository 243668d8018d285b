//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! thock-cli admin grant -e ops@thockshop.io
//! ```
//!
//! There is deliberately no HTTP route for this; admin rights are granted
//! from the operator's shell only.

use thiserror::Error;

use thockshop_core::Email;
use thockshop_storefront::db::{RepositoryError, UserRepository};

use super::migrate::MigrationError;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with this email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// Database connection error.
    #[error(transparent)]
    Connection(#[from] MigrationError),

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Grant admin rights to an existing user.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid, the user does not exist, or
/// the database is unreachable.
pub async fn grant(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    users.grant_admin(&email).await.map_err(|e| match e {
        RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
        other => AdminError::Repository(other),
    })?;

    tracing::info!(%email, "admin rights granted");
    Ok(())
}
