//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Domain errors map to
//! user-facing JSON bodies (`{"success": false, "error": ...}` or, for
//! form-validation failures, `{"success": false, "errors": {field: msg}}`);
//! unexpected errors map to a generic 500 and are captured to Sentry.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::{CartError, OrderError, RepositoryError};
use crate::services::auth::AuthError;
use crate::services::mail::MailError;
use crate::services::oauth::OAuthError;

/// Field-level validation messages, serialized as a `{field: message}` map.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FormErrors(pub BTreeMap<String, String>);

impl FormErrors {
    /// A single field error.
    #[must_use]
    pub fn one(field: &str, message: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.to_owned(), message.to_owned());
        Self(map)
    }

    /// Collect `(field, message)` pairs.
    #[must_use]
    pub fn from_pairs<F: Into<String>, M: Into<String>>(
        pairs: impl IntoIterator<Item = (F, M)>,
    ) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(field, message)| (field.into(), message.into()))
                .collect(),
        )
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    /// Order operation failed.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// OAuth flow failed.
    #[error("oauth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Email delivery failed.
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Form validation failed with field-level messages.
    #[error("validation failed")]
    Form(FormErrors),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// What a given error should look like on the wire.
enum Shape {
    Message(StatusCode, String),
    Fields(StatusCode, FormErrors),
}

impl AppError {
    fn is_unexpected(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound) => false,
            Self::Database(_) | Self::Internal(_) | Self::Mail(_) => true,
            Self::Auth(AuthError::Repository(_)) => true,
            Self::Cart(CartError::Repository(_)) => true,
            Self::Order(OrderError::Repository(_)) => true,
            _ => false,
        }
    }

    fn shape(self) -> Shape {
        match self {
            Self::Database(RepositoryError::NotFound) => {
                Shape::Message(StatusCode::NOT_FOUND, "not found".to_owned())
            }
            Self::Database(_) | Self::Internal(_) | Self::Mail(_) => Shape::Message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_owned(),
            ),

            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    Shape::Message(StatusCode::UNAUTHORIZED, "invalid credentials".to_owned())
                }
                AuthError::EmailTaken => Shape::Fields(
                    StatusCode::BAD_REQUEST,
                    FormErrors::one("email", "already registered"),
                ),
                AuthError::InvalidEmail(_) => Shape::Fields(
                    StatusCode::BAD_REQUEST,
                    FormErrors::one("email", "invalid email address"),
                ),
                AuthError::WeakPassword(msg) => {
                    Shape::Fields(StatusCode::BAD_REQUEST, FormErrors::one("password", &msg))
                }
                AuthError::BreachedPassword => Shape::Fields(
                    StatusCode::BAD_REQUEST,
                    FormErrors::one(
                        "password",
                        "this password has appeared in a data breach, choose another",
                    ),
                ),
                AuthError::AccountDisabled => {
                    Shape::Message(StatusCode::FORBIDDEN, "this account is disabled".to_owned())
                }
                AuthError::ProviderConflict { existing } => Shape::Message(
                    StatusCode::CONFLICT,
                    format!("an account with this email already exists via {existing}"),
                ),
                AuthError::OAuthEmailMissing => Shape::Message(
                    StatusCode::BAD_REQUEST,
                    "the provider did not supply an email address".to_owned(),
                ),
                AuthError::InvalidResetToken => Shape::Message(
                    StatusCode::BAD_REQUEST,
                    "this reset link is invalid or has expired".to_owned(),
                ),
                AuthError::Repository(_) => Shape::Message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                ),
            },

            Self::Cart(err) => match err {
                CartError::VariantNotFound => {
                    Shape::Message(StatusCode::NOT_FOUND, "variant not found".to_owned())
                }
                CartError::ItemNotFound => {
                    Shape::Message(StatusCode::NOT_FOUND, "cart item not found".to_owned())
                }
                CartError::InsufficientStock { .. }
                | CartError::InvalidQuantity
                | CartError::InvalidDiscount(_) => {
                    Shape::Message(StatusCode::BAD_REQUEST, err.to_string())
                }
                CartError::Repository(_) => Shape::Message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                ),
            },

            Self::Order(err) => match err {
                OrderError::InvalidAddress(fields) => {
                    Shape::Fields(StatusCode::BAD_REQUEST, FormErrors::from_pairs(fields))
                }
                OrderError::EmptyCart | OrderError::MissingPayment => {
                    Shape::Message(StatusCode::BAD_REQUEST, err.to_string())
                }
                OrderError::NotFound => {
                    Shape::Message(StatusCode::NOT_FOUND, "order not found".to_owned())
                }
                OrderError::InvalidTransition { .. } => {
                    Shape::Message(StatusCode::CONFLICT, err.to_string())
                }
                OrderError::Repository(_) => Shape::Message(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                ),
            },

            // Upstream OAuth failures surface as a generic 400; no retry.
            Self::OAuth(_) => {
                Shape::Message(StatusCode::BAD_REQUEST, "sign-in failed".to_owned())
            }

            Self::NotFound(what) => Shape::Message(StatusCode::NOT_FOUND, what),
            Self::Unauthorized(msg) => Shape::Message(StatusCode::UNAUTHORIZED, msg),
            Self::BadRequest(msg) => Shape::Message(StatusCode::BAD_REQUEST, msg),
            Self::Form(errors) => Shape::Fields(StatusCode::BAD_REQUEST, errors),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        } else {
            tracing::debug!(error = %self, "domain error");
        }

        match self.shape() {
            Shape::Message(status, error) => (
                status,
                Json(serde_json::json!({ "success": false, "error": error })),
            )
                .into_response(),
            Shape::Fields(status, errors) => (
                status,
                Json(serde_json::json!({ "success": false, "errors": errors })),
            )
                .into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("nope".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("who".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Cart(CartError::InsufficientStock {
                requested: 3,
                available: 1
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::OAuth(OAuthError::Exchange("timeout".to_owned()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_email_taken_maps_to_field_error() {
        let shape = AppError::Auth(AuthError::EmailTaken).shape();
        match shape {
            Shape::Fields(status, errors) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(
                    errors.0.get("email").map(String::as_str),
                    Some("already registered")
                );
            }
            Shape::Message(..) => panic!("expected field errors"),
        }
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let shape = AppError::Internal("connection string with password".to_owned()).shape();
        match shape {
            Shape::Message(_, message) => assert_eq!(message, "internal server error"),
            Shape::Fields(..) => panic!("expected message"),
        }
    }
}
