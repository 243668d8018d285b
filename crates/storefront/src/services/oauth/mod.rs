//! OAuth clients for federated login.
//!
//! One client per provider (GitHub, Google, Facebook, Microsoft), all the
//! same shape: build an authorization URL with a caller-supplied CSRF state,
//! exchange the callback code for an access token, then fetch the user's
//! profile from the provider's userinfo endpoint. Google additionally runs
//! PKCE.
//!
//! All outbound calls go through the shared `reqwest` client, which carries a
//! bounded timeout - a hung provider fails the login instead of wedging the
//! request.

mod profile;

pub use profile::{OAuthProfile, fetch_profile};

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
    basic::BasicClient,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use url::Url;

use thockshop_core::OAuthProvider;

use crate::config::OAuthConfig;

/// Fully configured oauth2 client: authorization and token endpoints set,
/// nothing else.
pub type ConfiguredClient = oauth2::Client<
    oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>,
    oauth2::StandardTokenIntrospectionResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
    oauth2::StandardRevocableToken,
    oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Errors from the OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Provider endpoints or credentials failed to parse at startup.
    #[error("oauth configuration error: {0}")]
    Config(String),

    /// Code-for-token exchange failed.
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// Userinfo fetch or decode failed.
    #[error("profile fetch failed: {0}")]
    Profile(String),

    /// The provider did not report a usable email address.
    #[error("provider did not supply an email address")]
    MissingEmail,
}

/// Static endpoint table per provider.
struct Endpoints {
    auth: &'static str,
    token: &'static str,
    scopes: &'static [&'static str],
}

const fn endpoints(provider: OAuthProvider) -> Endpoints {
    match provider {
        OAuthProvider::Github => Endpoints {
            auth: "https://github.com/login/oauth/authorize",
            token: "https://github.com/login/oauth/access_token",
            scopes: &["read:user", "user:email"],
        },
        OAuthProvider::Google => Endpoints {
            auth: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            scopes: &["openid", "email", "profile"],
        },
        OAuthProvider::Facebook => Endpoints {
            auth: "https://www.facebook.com/v19.0/dialog/oauth",
            token: "https://graph.facebook.com/v19.0/oauth/access_token",
            scopes: &["email", "public_profile"],
        },
        OAuthProvider::Microsoft => Endpoints {
            auth: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            scopes: &["User.Read"],
        },
    }
}

/// A provider's configured client plus its scope list.
pub struct ProviderClient {
    provider: OAuthProvider,
    client: ConfiguredClient,
    scopes: Vec<Scope>,
}

impl ProviderClient {
    fn new(
        provider: OAuthProvider,
        client_id: &str,
        client_secret: &secrecy::SecretString,
        redirect_uri: String,
    ) -> Result<Self, OAuthError> {
        let table = endpoints(provider);

        let auth_url = AuthUrl::new(table.auth.to_owned())
            .map_err(|e| OAuthError::Config(format!("{provider} auth url: {e}")))?;
        let token_url = TokenUrl::new(table.token.to_owned())
            .map_err(|e| OAuthError::Config(format!("{provider} token url: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri)
            .map_err(|e| OAuthError::Config(format!("{provider} redirect url: {e}")))?;

        let client = BasicClient::new(ClientId::new(client_id.to_owned()))
            .set_client_secret(ClientSecret::new(client_secret.expose_secret().to_owned()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        Ok(Self {
            provider,
            client,
            scopes: table.scopes.iter().map(|s| Scope::new((*s).to_owned())).collect(),
        })
    }

    /// Which provider this client talks to.
    #[must_use]
    pub const fn provider(&self) -> OAuthProvider {
        self.provider
    }

    /// Build the authorization redirect for a caller-supplied CSRF state.
    ///
    /// Returns the URL to send the browser to, and the PKCE verifier to stash
    /// in a cookie when the provider runs PKCE (Google).
    #[must_use]
    pub fn authorization_request(&self, state: &str) -> (Url, Option<PkceCodeVerifier>) {
        let mut request = self
            .client
            .authorize_url(|| CsrfToken::new(state.to_owned()));
        for scope in &self.scopes {
            request = request.add_scope(scope.clone());
        }

        if self.provider == OAuthProvider::Google {
            let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
            let (url, _csrf) = request.set_pkce_challenge(challenge).url();
            (url, Some(verifier))
        } else {
            let (url, _csrf) = request.url();
            (url, None)
        }
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Exchange` on any HTTP or protocol failure. Not
    /// retried; the shopper just logs in again.
    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: Option<String>,
        http: &reqwest::Client,
    ) -> Result<String, OAuthError> {
        let mut request = self.client.exchange_code(AuthorizationCode::new(code));
        if let Some(verifier) = pkce_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier));
        }

        let token = request
            .request_async(http)
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        Ok(token.access_token().secret().clone())
    }
}

/// All provider clients, built once at startup.
pub struct OAuthClients {
    github: ProviderClient,
    google: ProviderClient,
    facebook: ProviderClient,
    microsoft: ProviderClient,
}

impl OAuthClients {
    /// Build every provider client from configuration.
    ///
    /// The redirect URI for each provider is
    /// `{base_url}/auth/callback/{provider}`.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Config` if any endpoint fails to parse.
    pub fn new(config: &OAuthConfig, base_url: &str) -> Result<Self, OAuthError> {
        let redirect = |provider: OAuthProvider| {
            format!(
                "{}/auth/callback/{}",
                base_url.trim_end_matches('/'),
                provider
            )
        };

        Ok(Self {
            github: ProviderClient::new(
                OAuthProvider::Github,
                &config.github.client_id,
                &config.github.client_secret,
                redirect(OAuthProvider::Github),
            )?,
            google: ProviderClient::new(
                OAuthProvider::Google,
                &config.google.client_id,
                &config.google.client_secret,
                redirect(OAuthProvider::Google),
            )?,
            facebook: ProviderClient::new(
                OAuthProvider::Facebook,
                &config.facebook.client_id,
                &config.facebook.client_secret,
                redirect(OAuthProvider::Facebook),
            )?,
            microsoft: ProviderClient::new(
                OAuthProvider::Microsoft,
                &config.microsoft.client_id,
                &config.microsoft.client_secret,
                redirect(OAuthProvider::Microsoft),
            )?,
        })
    }

    /// The client for a provider.
    #[must_use]
    pub const fn get(&self, provider: OAuthProvider) -> &ProviderClient {
        match provider {
            OAuthProvider::Github => &self.github,
            OAuthProvider::Google => &self.google,
            OAuthProvider::Facebook => &self.facebook,
            OAuthProvider::Microsoft => &self.microsoft,
        }
    }
}

/// Generate a random state string for the authorization round-trip.
#[must_use]
pub fn generate_state() -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            char::from(CHARSET[idx])
        })
        .collect()
}

/// Whether the state echoed back by the provider matches the cookie value.
///
/// State is not a secret (it is in the URL), so a plain comparison is fine;
/// what matters is rejecting on any mismatch or absence.
#[must_use]
pub fn callback_state_valid(returned: &str, stored: Option<&str>) -> bool {
    stored.is_some_and(|stored| !returned.is_empty() && stored == returned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state_shape() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_callback_state_validation() {
        assert!(callback_state_valid("abc123", Some("abc123")));
        assert!(!callback_state_valid("abc123", Some("different")));
        assert!(!callback_state_valid("abc123", None));
        assert!(!callback_state_valid("", Some("")));
    }
}
