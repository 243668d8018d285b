//! Authentication service.
//!
//! Registration, password login, session establishment, OAuth identity
//! resolution and password reset, composed over the user, session and reset
//! repositories.

mod error;

pub use error::AuthError;

use sqlx::PgPool;

use thockshop_core::{Email, UserId, UserStatus};

use crate::db::password_resets::PasswordResetRepository;
use crate::db::sessions::{SessionRepository, generate_session_token};
use crate::db::users::UserRepository;
use crate::db::RepositoryError;
use crate::models::session::{CurrentUser, Session};
use crate::models::user::User;
use crate::services::breach::BreachChecker;
use crate::services::oauth::OAuthProfile;
use crate::services::password::{hash_password, validate_password, verify_password};

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: SessionRepository<'a>,
    resets: PasswordResetRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            sessions: SessionRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidEmail`, `AuthError::WeakPassword`,
    /// `AuthError::BreachedPassword`, or `AuthError::EmailTaken`.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        breach: &BreachChecker,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password).map_err(|e| AuthError::WeakPassword(e.to_string()))?;

        if breach.is_breached(password).await {
            return Err(AuthError::BreachedPassword);
        }

        let password_hash = hash_password(password);

        self.users
            .create_with_password(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// Unknown email and wrong password return the same error.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` or `AuthError::AccountDisabled`.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, password_hash)) = self.users.get_password_hash(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        if user.status == UserStatus::Disabled {
            return Err(AuthError::AccountDisabled);
        }

        Ok(user)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Issue a fresh session for a user.
    ///
    /// Returns the raw token (for the cookie) and the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn establish_session(&self, user_id: UserId) -> Result<(String, Session), AuthError> {
        let token = generate_session_token();
        let session = self.sessions.create(&token, user_id).await?;
        Ok((token, session))
    }

    /// Validate a session token and produce the request identity.
    ///
    /// Renewal may write; see [`SessionRepository::validate`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on database failure.
    pub async fn current_user(&self, token: &str) -> Result<Option<CurrentUser>, AuthError> {
        let Some(session) = self.sessions.validate(token).await? else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_id(session.user_id).await? else {
            // Session points at a deleted user; treat as logged out.
            return Ok(None);
        };

        if user.status == UserStatus::Disabled {
            return Ok(None);
        }

        Ok(Some(CurrentUser {
            id: user.id,
            email: user.email,
            is_admin: user.is_admin,
        }))
    }

    /// Revoke the presented session (logout).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on database failure.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.invalidate(token).await?;
        Ok(())
    }

    // =========================================================================
    // OAuth identity resolution
    // =========================================================================

    /// Resolve an OAuth profile to a local user.
    ///
    /// Lookup order: the `(provider, subject)` identity key first, then the
    /// email. An email hit owned by a different provider (or a password
    /// account) is a conflict - accounts are never silently linked; the
    /// caller redirects with the conflicting provider's name. Otherwise a
    /// fresh federated account is created with `email_verified` set from the
    /// provider's trust level.
    ///
    /// # Errors
    ///
    /// `AuthError::OAuthEmailMissing`, `AuthError::ProviderConflict`,
    /// `AuthError::AccountDisabled`, or `AuthError::Repository`.
    pub async fn resolve_oauth_profile(&self, profile: &OAuthProfile) -> Result<User, AuthError> {
        if let Some(user) = self
            .users
            .get_by_identity(profile.provider, &profile.subject)
            .await?
        {
            if user.status == UserStatus::Disabled {
                return Err(AuthError::AccountDisabled);
            }
            return Ok(user);
        }

        let email = profile.email.clone().ok_or(AuthError::OAuthEmailMissing)?;

        if let Some(existing) = self.users.get_by_email(&email).await? {
            let existing_provider = existing
                .identity
                .map_or_else(|| "password".to_owned(), |i| i.provider.to_string());
            return Err(AuthError::ProviderConflict {
                existing: existing_provider,
            });
        }

        let user = self
            .users
            .create_federated(
                &email,
                profile.provider,
                &profile.subject,
                profile.provider.email_trusted(),
            )
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Begin a password reset for an email address.
    ///
    /// Returns the user and the raw token to mail, or `None` when no such
    /// account exists - callers respond identically either way so addresses
    /// cannot be enumerated.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` on database failure.
    pub async fn start_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            return Ok(None);
        };

        let token = generate_session_token();
        self.resets.create(&token, user.id).await?;

        Ok(Some((user, token)))
    }

    /// Complete a password reset.
    ///
    /// Sets the new password and revokes every session the user holds.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidResetToken`, `AuthError::WeakPassword`, or
    /// `AuthError::Repository`.
    pub async fn finish_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<User, AuthError> {
        validate_password(new_password).map_err(|e| AuthError::WeakPassword(e.to_string()))?;

        let Some(user_id) = self.resets.redeem(token).await? else {
            return Err(AuthError::InvalidResetToken);
        };

        let password_hash = hash_password(new_password);
        self.users.set_password_hash(user_id, &password_hash).await?;

        // Completing a reset proves control of the inbox.
        self.users.verify_email(user_id).await?;

        // Every existing session dies with the old password.
        self.sessions.invalidate_all_for_user(user_id).await?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)
    }
}
