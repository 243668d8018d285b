//! OAuth route handlers: initiate and callback, one pair for all providers.
//!
//! The round-trip state machine:
//!
//! 1. `GET /auth/login/{provider}` - generate CSRF state (and a PKCE
//!    verifier for Google), stash them in 10-minute cookies, copy the
//!    strict-same-site `cart-session` value into a lax side cookie so it
//!    survives the cross-site hop, redirect to the provider.
//! 2. `GET /auth/callback/{provider}` - reject on provider error, missing
//!    code/state or state mismatch (400, nothing created); exchange the code;
//!    fetch the profile; resolve it to a local account (conflicting email →
//!    302 back to the login page carrying the existing provider's name);
//!    merge the anonymous cart; issue the session cookie; clean up the
//!    transient cookies.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use thockshop_core::OAuthProvider;

use crate::cookies;
use crate::error::{AppError, Result};
use crate::routes::auth::finish_login;
use crate::services::auth::{AuthError, AuthService};
use crate::services::oauth::{callback_state_valid, fetch_profile, generate_state};
use crate::state::AppState;

/// Query parameters accepted when initiating a login.
#[derive(Debug, Deserialize)]
pub struct InitiateQuery {
    /// Site-local path to return to after login.
    pub redirect: Option<String>,
}

/// Query parameters from the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

fn parse_provider(raw: &str) -> Result<OAuthProvider> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("unknown provider: {raw}")))
}

/// Only site-local paths are allowed as post-login redirects.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

/// `GET /auth/login/{provider}`
#[instrument(skip(state, jar))]
pub async fn initiate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<InitiateQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let provider = parse_provider(&provider)?;
    let secure = state.config().cookies_secure();

    let oauth_state = generate_state();
    let (auth_url, pkce_verifier) = state.oauth().get(provider).authorization_request(&oauth_state);

    let cart_key = jar
        .get(cookies::CART_SESSION)
        .map(|cookie| cookie.value().to_owned());

    let mut jar = jar.add(cookies::oauth_transient(
        provider.state_cookie_name(),
        oauth_state,
        secure,
    ));

    if let Some(verifier) = pkce_verifier {
        jar = jar.add(cookies::oauth_transient(
            cookies::GOOGLE_CODE_VERIFIER.to_owned(),
            verifier.secret().clone(),
            secure,
        ));
    }

    if let Some(redirect) = query.redirect.filter(|path| is_local_path(path)) {
        jar = jar.add(cookies::oauth_transient(
            cookies::OAUTH_REDIRECT.to_owned(),
            redirect,
            secure,
        ));
    }

    // The strict cart-session cookie will not ride along on the cross-site
    // callback request; carry its value in a lax cookie for the duration.
    if let Some(cart_key) = cart_key {
        jar = jar.add(cookies::oauth_transient(
            cookies::PRESERVED_CART_SESSION.to_owned(),
            cart_key,
            secure,
        ));
    }

    Ok((jar, Redirect::to(auth_url.as_str())))
}

/// `GET /auth/callback/{provider}`
#[instrument(skip(state, jar, query))]
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(%provider, "provider reported oauth error: {error} - {description}");
        return Err(AppError::BadRequest("sign-in was cancelled".to_owned()));
    }

    let Some(code) = query.code else {
        return Err(AppError::BadRequest("missing authorization code".to_owned()));
    };
    let Some(returned_state) = query.state else {
        return Err(AppError::BadRequest("missing state".to_owned()));
    };

    let state_cookie = provider.state_cookie_name();
    let stored_state = jar.get(&state_cookie).map(|cookie| cookie.value().to_owned());
    if !callback_state_valid(&returned_state, stored_state.as_deref()) {
        tracing::warn!(%provider, "oauth state mismatch");
        return Err(AppError::BadRequest("state mismatch".to_owned()));
    }

    let pkce_verifier = (provider == OAuthProvider::Google)
        .then(|| {
            jar.get(cookies::GOOGLE_CODE_VERIFIER)
                .map(|cookie| cookie.value().to_owned())
        })
        .flatten();

    // Exchange and profile fetch; any upstream failure surfaces as a 400,
    // never retried.
    let access_token = state
        .oauth()
        .get(provider)
        .exchange_code(code, pkce_verifier, state.http())
        .await?;
    let profile = fetch_profile(provider, &access_token, state.http()).await?;

    let auth = AuthService::new(state.pool());
    let user = match auth.resolve_oauth_profile(&profile).await {
        Ok(user) => user,
        Err(AuthError::ProviderConflict { existing }) => {
            // Never silently link accounts; send the shopper back with the
            // provider that already owns this email.
            let location = format!("/auth/login?error=account_exists&provider={existing}");
            let jar = clear_transient_cookies(jar, &state_cookie);
            return Ok((StatusCode::FOUND, jar, [(LOCATION, location)]).into_response());
        }
        Err(other) => return Err(other.into()),
    };

    // The strict cart-session cookie is absent on this cross-site request;
    // fall back to the preserved copy.
    let cart_key = jar
        .get(cookies::CART_SESSION)
        .or_else(|| jar.get(cookies::PRESERVED_CART_SESSION))
        .map(|cookie| cookie.value().to_owned());

    let redirect_target = jar
        .get(cookies::OAUTH_REDIRECT)
        .map(|cookie| cookie.value().to_owned())
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/account".to_owned());

    let jar = finish_login(&state, jar, user.id, cart_key).await?;
    let jar = clear_transient_cookies(jar, &state_cookie);

    tracing::info!(user_id = %user.id, %provider, "oauth login completed");

    Ok((jar, Redirect::to(&redirect_target)).into_response())
}

/// Drop every cookie that only exists for the duration of the round-trip.
fn clear_transient_cookies(jar: CookieJar, state_cookie: &str) -> CookieJar {
    jar.add(cookies::expired(state_cookie.to_owned()))
        .add(cookies::expired(cookies::GOOGLE_CODE_VERIFIER.to_owned()))
        .add(cookies::expired(cookies::OAUTH_REDIRECT.to_owned()))
        .add(cookies::expired(cookies::PRESERVED_CART_SESSION.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("/checkout"));
        assert!(is_local_path("/"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("checkout"));
    }
}
