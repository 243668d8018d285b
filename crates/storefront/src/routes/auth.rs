//! Authentication route handlers.
//!
//! Login, registration, logout and password reset. Successful login (any
//! path, including OAuth) issues the `auth-session` cookie and folds the
//! anonymous cart into the user's cart.

use axum::{Form, Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use thockshop_core::UserId;

use crate::cookies;
use crate::db::carts::CartRepository;
use crate::error::{AppError, FormErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::session::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Form and response types
// =============================================================================

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

/// User data returned to clients.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub email_verified: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.to_string(),
            email_verified: user.email_verified,
        }
    }
}

/// Standard auth action response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserView,
}

// =============================================================================
// Shared login plumbing
// =============================================================================

/// Establish a session for `user_id`: merge the anonymous cart into the
/// user's cart, then issue the `auth-session` cookie.
///
/// Used by password login, registration and the OAuth callback.
pub async fn finish_login(
    state: &AppState,
    jar: CookieJar,
    user_id: UserId,
    cart_session_key: Option<String>,
) -> Result<CookieJar> {
    if let Some(cart_key) = cart_session_key {
        CartRepository::new(state.pool())
            .merge_guest_cart_on_login(&cart_key, user_id)
            .await?;
    }

    let auth = AuthService::new(state.pool());
    let (token, _session) = auth.establish_session(user_id).await?;

    Ok(jar.add(cookies::auth_session(token, state.config().cookies_secure())))
}

fn ensure_passwords_match(password: &str, confirm: &str) -> Result<()> {
    if password == confirm {
        Ok(())
    } else {
        Err(AppError::Form(FormErrors::one(
            "password_confirm",
            "passwords do not match",
        )))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /auth/register`
#[instrument(skip_all, fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    ensure_passwords_match(&form.password, &form.password_confirm)?;

    let auth = AuthService::new(state.pool());
    let user = auth
        .register(&form.email, &form.password, state.breach())
        .await?;

    let cart_key = jar
        .get(cookies::CART_SESSION)
        .map(|c| c.value().to_owned());
    let jar = finish_login(&state, jar, user.id, cart_key).await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: UserView::from(&user),
        }),
    ))
}

/// `POST /auth/login`
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&form.email, &form.password).await?;

    let cart_key = jar
        .get(cookies::CART_SESSION)
        .map(|c| c.value().to_owned());
    let jar = finish_login(&state, jar, user.id, cart_key).await?;

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: UserView::from(&user),
        }),
    ))
}

/// `POST /auth/logout`
///
/// Revokes the presented session and clears the cookie. Always succeeds.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    if let Some(cookie) = jar.get(cookies::AUTH_SESSION) {
        let auth = AuthService::new(state.pool());
        auth.logout(cookie.value()).await?;
    }

    let jar = jar.add(cookies::expired(cookies::AUTH_SESSION.to_owned()));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}

/// `GET /account`
pub async fn account(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}

/// `POST /auth/forgot-password`
///
/// Always responds success so email addresses cannot be enumerated. When the
/// account exists, a single-use reset link is mailed; a failed send is
/// logged and still reported as success.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Json<serde_json::Value>> {
    let auth = AuthService::new(state.pool());

    if let Some((user, token)) = auth.start_password_reset(&form.email).await? {
        let reset_url = format!(
            "{}/auth/reset-password?token={}",
            state.config().base_url.trim_end_matches('/'),
            token
        );
        if let Err(e) = state
            .mailer()
            .send_password_reset(&user.email, &reset_url)
            .await
        {
            tracing::error!(user_id = %user.id, "failed to send reset email: {e}");
        }
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// `POST /auth/reset-password`
///
/// Redeems the token, sets the new password, and revokes all of the user's
/// sessions. The user logs in again with the new password.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ResetPasswordForm>,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    ensure_passwords_match(&form.password, &form.password_confirm)?;

    let auth = AuthService::new(state.pool());
    let user = auth
        .finish_password_reset(&form.token, &form.password)
        .await?;

    tracing::info!(user_id = %user.id, "password reset completed, sessions revoked");

    let jar = jar.add(cookies::expired(cookies::AUTH_SESSION.to_owned()));
    Ok((jar, Json(serde_json::json!({ "success": true }))))
}
