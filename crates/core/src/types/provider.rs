//! Federated identity providers.

use serde::{Deserialize, Serialize};

/// An OAuth identity provider supported for federated login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Github,
    Google,
    Facebook,
    Microsoft,
}

impl OAuthProvider {
    /// All supported providers.
    pub const ALL: [Self; 4] = [Self::Github, Self::Google, Self::Facebook, Self::Microsoft];

    /// Stable string form, used in the database, routes and cookie names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
            Self::Facebook => "facebook",
            Self::Microsoft => "microsoft",
        }
    }

    /// Name of the short-lived cookie holding the CSRF state for this
    /// provider's authorization round-trip.
    #[must_use]
    pub fn state_cookie_name(self) -> String {
        format!("{}_oauth_state", self.as_str())
    }

    /// Whether an email address reported by this provider is considered
    /// verified when creating a local account.
    ///
    /// GitHub, Google and Microsoft only hand out addresses they have
    /// confirmed; Facebook may return unconfirmed contact addresses, so those
    /// accounts start unverified.
    #[must_use]
    pub const fn email_trusted(self) -> bool {
        match self {
            Self::Github | Self::Google | Self::Microsoft => true,
            Self::Facebook => false,
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            "facebook" => Ok(Self::Facebook),
            "microsoft" => Ok(Self::Microsoft),
            _ => Err(format!("unknown oauth provider: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        for provider in OAuthProvider::ALL {
            assert_eq!(provider.as_str().parse::<OAuthProvider>(), Ok(provider));
        }
    }

    #[test]
    fn test_state_cookie_name() {
        assert_eq!(
            OAuthProvider::Google.state_cookie_name(),
            "google_oauth_state"
        );
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!("twitter".parse::<OAuthProvider>().is_err());
    }
}
