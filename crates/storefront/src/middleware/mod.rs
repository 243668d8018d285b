//! HTTP middleware stack for the storefront.
//!
//! # Middleware order (bottom to top in the Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting (governor; strict on `/auth`, relaxed elsewhere)
//!
//! Authentication is an extractor ([`RequireAuth`]/[`OptionalAuth`]) rather
//! than a layer: session validation can renew the session row, so it runs
//! only for handlers that ask for the user.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{OptionalAuth, RequireAuth};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
