//! Authentication extractors.
//!
//! Session validation happens here, against the `auth-session` cookie. Note
//! that validating a token can renew the session row (sliding expiry), so
//! extracting the current user is a potential database write.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::cookies;
use crate::models::session::CurrentUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but absent or stale.
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": "authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection)?;

        user.map(Self).ok_or(AuthRejection)
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike [`RequireAuth`], this does not reject the request when nobody is
/// logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(cookies::AUTH_SESSION) else {
            return Ok(Self(None));
        };

        let auth = AuthService::new(app_state.pool());
        match auth.current_user(cookie.value()).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                // Validation failure reads as logged out, never as an error.
                tracing::error!("session validation failed: {e}");
                Ok(Self(None))
            }
        }
    }
}
