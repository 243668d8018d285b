//! Userinfo fetch per provider.
//!
//! After the code exchange, each provider exposes the authenticated user at a
//! different endpoint with a different payload shape. This module flattens
//! them into [`OAuthProfile`].

use serde::Deserialize;

use thockshop_core::{Email, OAuthProvider};

use super::OAuthError;

/// The provider-independent identity extracted from a userinfo response.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    /// The provider's stable identifier for this user.
    pub subject: String,
    /// Verified-enough email address; `None` when the provider withheld one.
    pub email: Option<Email>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmailEntry {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    sub: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookUser {
    id: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MicrosoftUser {
    id: String,
    display_name: Option<String>,
    mail: Option<String>,
    user_principal_name: Option<String>,
}

/// Fetch the authenticated user's profile from the provider.
///
/// # Errors
///
/// Returns `OAuthError::Profile` on HTTP or decode failure. Not retried.
pub async fn fetch_profile(
    provider: OAuthProvider,
    access_token: &str,
    http: &reqwest::Client,
) -> Result<OAuthProfile, OAuthError> {
    match provider {
        OAuthProvider::Github => fetch_github(access_token, http).await,
        OAuthProvider::Google => fetch_google(access_token, http).await,
        OAuthProvider::Facebook => fetch_facebook(access_token, http).await,
        OAuthProvider::Microsoft => fetch_microsoft(access_token, http).await,
    }
}

async fn fetch_github(
    access_token: &str,
    http: &reqwest::Client,
) -> Result<OAuthProfile, OAuthError> {
    let user: GithubUser = http
        .get("https://api.github.com/user")
        .header("User-Agent", "thockshop-storefront")
        .header("Accept", "application/vnd.github+json")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .error_for_status()
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .json()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?;

    // The profile email is often hidden; the emails endpoint lists the
    // verified addresses regardless.
    let email = match &user.email {
        Some(email) => Some(email.clone()),
        None => {
            let entries: Vec<GithubEmailEntry> = http
                .get("https://api.github.com/user/emails")
                .header("User-Agent", "thockshop-storefront")
                .header("Accept", "application/vnd.github+json")
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| OAuthError::Profile(e.to_string()))?
                .error_for_status()
                .map_err(|e| OAuthError::Profile(e.to_string()))?
                .json()
                .await
                .map_err(|e| OAuthError::Profile(e.to_string()))?;

            entries
                .iter()
                .find(|entry| entry.primary && entry.verified)
                .or_else(|| entries.iter().find(|entry| entry.verified))
                .map(|entry| entry.email.clone())
        }
    };

    Ok(OAuthProfile {
        provider: OAuthProvider::Github,
        subject: user.id.to_string(),
        email: email.and_then(|e| Email::parse(&e).ok()),
        name: user.name,
    })
}

async fn fetch_google(
    access_token: &str,
    http: &reqwest::Client,
) -> Result<OAuthProfile, OAuthError> {
    let user: GoogleUser = http
        .get("https://openidconnect.googleapis.com/v1/userinfo")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .error_for_status()
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .json()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?;

    Ok(OAuthProfile {
        provider: OAuthProvider::Google,
        subject: user.sub,
        email: user.email.and_then(|e| Email::parse(&e).ok()),
        name: user.name,
    })
}

async fn fetch_facebook(
    access_token: &str,
    http: &reqwest::Client,
) -> Result<OAuthProfile, OAuthError> {
    let user: FacebookUser = http
        .get("https://graph.facebook.com/me")
        .query(&[("fields", "id,name,email")])
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .error_for_status()
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .json()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?;

    Ok(OAuthProfile {
        provider: OAuthProvider::Facebook,
        subject: user.id,
        email: user.email.and_then(|e| Email::parse(&e).ok()),
        name: user.name,
    })
}

async fn fetch_microsoft(
    access_token: &str,
    http: &reqwest::Client,
) -> Result<OAuthProfile, OAuthError> {
    let user: MicrosoftUser = http
        .get("https://graph.microsoft.com/v1.0/me")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .error_for_status()
        .map_err(|e| OAuthError::Profile(e.to_string()))?
        .json()
        .await
        .map_err(|e| OAuthError::Profile(e.to_string()))?;

    // Personal accounts populate `mail`; some org accounts only expose the
    // principal name, which is the sign-in address.
    let email = user.mail.or(user.user_principal_name);

    Ok(OAuthProfile {
        provider: OAuthProvider::Microsoft,
        subject: user.id,
        email: email.and_then(|e| Email::parse(&e).ok()),
        name: user.display_name,
    })
}
