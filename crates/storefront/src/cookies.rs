//! Cookie names and builders.
//!
//! Names and semantics are part of the external interface and must stay
//! stable:
//!
//! - `auth-session` - opaque session token, httpOnly, lax, 30 days
//! - `cart-session` - anonymous cart identity, httpOnly, strict, 30 days
//! - `{provider}_oauth_state`, `google_code_verifier` - 10-minute CSRF/PKCE
//!   material for the OAuth round-trip
//! - `oauth_redirect`, `preserved_cart_session` - 10-minute continuation
//!   state carried across the OAuth redirect (the strict `cart-session`
//!   cookie is not sent on the cross-site callback, hence the lax side copy)
//! - `PARAGLIDE_LOCALE` - non-httpOnly, 1 year, drives localized rendering

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::db::sessions::generate_session_token;

/// Session token cookie.
pub const AUTH_SESSION: &str = "auth-session";

/// Anonymous cart identity cookie.
pub const CART_SESSION: &str = "cart-session";

/// PKCE verifier cookie (Google only).
pub const GOOGLE_CODE_VERIFIER: &str = "google_code_verifier";

/// Post-login redirect path cookie.
pub const OAUTH_REDIRECT: &str = "oauth_redirect";

/// Lax copy of `cart-session` that survives the OAuth redirect.
pub const PRESERVED_CART_SESSION: &str = "preserved_cart_session";

/// Locale selection cookie.
pub const LOCALE: &str = "PARAGLIDE_LOCALE";

/// Lifetime of the transient OAuth cookies.
const OAUTH_COOKIE_TTL: Duration = Duration::minutes(10);

/// Lifetime of the session and cart cookies.
const MONTH: Duration = Duration::days(30);

/// Build the `auth-session` cookie for a freshly issued token.
#[must_use]
pub fn auth_session(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_SESSION, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(MONTH)
        .secure(secure)
        .build()
}

/// Build the `cart-session` cookie.
#[must_use]
pub fn cart_session(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CART_SESSION, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Strict)
        .max_age(MONTH)
        .secure(secure)
        .build()
}

/// Build one of the short-lived OAuth cookies (state, verifier, redirect,
/// preserved cart session).
#[must_use]
pub fn oauth_transient(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(OAUTH_COOKIE_TTL)
        .secure(secure)
        .build()
}

/// Build the locale cookie. Readable by client scripts on purpose.
#[must_use]
pub fn locale(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((LOCALE, value))
        .http_only(false)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(Duration::days(365))
        .secure(secure)
        .build()
}

/// A cookie that expires the named one.
#[must_use]
pub fn expired(name: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

/// Read the anonymous cart key from the jar, minting one (and the cookie)
/// when absent.
#[must_use]
pub fn ensure_cart_session(jar: CookieJar, secure: bool) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(CART_SESSION) {
        let value = cookie.value().to_owned();
        return (jar, value);
    }

    let value = generate_session_token();
    let jar = jar.add(cart_session(value.clone(), secure));
    (jar, value)
}
