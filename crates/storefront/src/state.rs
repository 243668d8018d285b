//! Application state shared across handlers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::content::{ContentError, ContentStore};
use crate::services::breach::BreachChecker;
use crate::services::mail::EmailService;
use crate::services::oauth::{OAuthClients, OAuthError};

/// Total timeout for any outbound HTTP call (OAuth exchange, userinfo,
/// breach check). A hung upstream fails the request instead of wedging it.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oauth: {0}")]
    OAuth(#[from] OAuthError),
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("content: {0}")]
    Content(#[from] ContentError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    http: reqwest::Client,
    oauth: OAuthClients,
    mailer: EmailService,
    breach: BreachChecker,
    content: ContentStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client, OAuth clients, SMTP transport or
    /// content store cannot be built.
    pub fn new(
        config: StorefrontConfig,
        pool: PgPool,
        content_dir: &Path,
    ) -> Result<Self, StateInitError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let oauth = OAuthClients::new(&config.oauth, &config.base_url)?;
        let mailer = EmailService::new(&config.mail)?;
        let breach = BreachChecker::new(http.clone(), config.breach_api_base_url.clone());
        let content = ContentStore::load(content_dir)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                oauth,
                mailer,
                breach,
                content,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the shared outbound HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Get a reference to the OAuth provider clients.
    #[must_use]
    pub fn oauth(&self) -> &OAuthClients {
        &self.inner.oauth
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn mailer(&self) -> &EmailService {
        &self.inner.mailer
    }

    /// Get a reference to the breach checker.
    #[must_use]
    pub fn breach(&self) -> &BreachChecker {
        &self.inner.breach
    }

    /// Get a reference to the content store.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.inner.content
    }
}
