//! Leaked-password check against a k-anonymity range API.
//!
//! Only the first five characters of the password's SHA-1 hash are sent; the
//! full hash is compared locally against the returned suffix list, so the
//! password (and its hash) never leave the process.
//!
//! Failure policy: the check fails open. A network error, timeout or non-2xx
//! response is logged and treated as "not breached" - registration must not
//! hinge on a third-party API being up. Only an explicit suffix match blocks.

use std::time::Duration;

use sha1::{Digest, Sha1};

/// Per-request timeout for the range lookup.
const BREACH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the breach range API.
#[derive(Clone)]
pub struct BreachChecker {
    http: reqwest::Client,
    base_url: String,
}

impl BreachChecker {
    /// Create a checker against `base_url` (e.g. `https://api.pwnedpasswords.com`).
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Whether the password appears in the breach corpus.
    pub async fn is_breached(&self, password: &str) -> bool {
        let hash = sha1_hex_upper(password);
        let (prefix, suffix) = hash.split_at(5);
        let url = format!("{}/range/{prefix}", self.base_url);

        let response = self
            .http
            .get(&url)
            .timeout(BREACH_CHECK_TIMEOUT)
            .send()
            .await;

        let body = match response {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("breach check body read failed, failing open: {e}");
                    return false;
                }
            },
            Ok(response) => {
                tracing::warn!(
                    status = %response.status(),
                    "breach check returned non-success, failing open"
                );
                return false;
            }
            Err(e) => {
                tracing::warn!("breach check request failed, failing open: {e}");
                return false;
            }
        };

        suffix_listed(&body, suffix)
    }
}

/// Uppercase hex SHA-1 of the password.
fn sha1_hex_upper(password: &str) -> String {
    let digest = Sha1::digest(password.as_bytes());
    digest.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// Whether `suffix` appears in a `SUFFIX:COUNT` range response body.
fn suffix_listed(body: &str, suffix: &str) -> bool {
    body.lines().any(|line| {
        line.split_once(':')
            .is_some_and(|(candidate, _count)| candidate.eq_ignore_ascii_case(suffix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex_upper_known_vector() {
        // SHA-1("password")
        assert_eq!(
            sha1_hex_upper("password"),
            "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8"
        );
    }

    #[test]
    fn test_suffix_listed_matches_case_insensitively() {
        let body = "0018A45C4D1DEF81644B54AB7F969B88D65:1\r\n\
                    00D4F6E8FA6EECAD2A3AA415EEC418D38EC:2\r\n\
                    011053FD0102E94D6AE2F8B83D76FAF94F6:1";
        assert!(suffix_listed(body, "00d4f6e8fa6eecad2a3aa415eec418d38ec"));
        assert!(suffix_listed(body, "0018A45C4D1DEF81644B54AB7F969B88D65"));
        assert!(!suffix_listed(body, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"));
    }

    #[test]
    fn test_suffix_listed_ignores_malformed_lines() {
        assert!(!suffix_listed("garbage without colon", "ABC"));
        assert!(!suffix_listed("", "ABC"));
    }
}
