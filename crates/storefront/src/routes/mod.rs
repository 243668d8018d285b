//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (DB ping)
//!
//! # Catalogue
//! GET  /products                    - Paginated product listing (?category=)
//! GET  /products/{slug}             - Product detail
//! GET  /catalogue                   - Products grouped by category
//!
//! # Cart (form actions, JSON responses)
//! GET  /cart                        - Current cart view
//! POST /cart/add                    - Add item (stock-checked)
//! POST /cart/update                 - Update line quantity
//! POST /cart/remove                 - Remove line
//! POST /cart/discount               - Apply discount code
//! POST /cart/discount/remove        - Remove discount
//! POST /cart/clear                  - Empty the cart
//!
//! # Checkout & orders
//! POST /checkout/place-order        - Create order from cart
//! GET  /orders                      - Order history (auth)
//! GET  /orders/{id}                 - Order detail (auth, ownership-checked)
//! POST /orders/{id}/status          - Status transition (admin)
//!
//! # Auth (rate limited)
//! POST /auth/register               - Register with email/password
//! POST /auth/login                  - Password login
//! POST /auth/logout                 - Revoke session
//! POST /auth/forgot-password        - Start password reset
//! POST /auth/reset-password         - Complete password reset
//! GET  /auth/login/{provider}       - Initiate OAuth
//! GET  /auth/callback/{provider}    - Complete OAuth
//! GET  /account                     - Current user (auth)
//!
//! # Content
//! GET  /pages/{slug}                - Localized page (sections as HTML)
//! POST /locale                      - Set the locale cookie
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod oauth;
pub mod orders;
pub mod pages;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router (strictly rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        // Federated login
        .route("/login/{provider}", get(oauth::initiate))
        .route("/callback/{provider}", get(oauth::callback))
        .layer(auth_rate_limiter())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add_item))
        .route("/update", post(cart::update_item))
        .route("/remove", post(cart::remove_item))
        .route("/discount", post(cart::apply_discount))
        .route("/discount/remove", post(cart::remove_discount))
        .route("/clear", post(cart::clear))
        .layer(api_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/catalogue", get(products::catalogue))
        .nest("/cart", cart_routes())
        .route("/checkout/place-order", post(checkout::place_order))
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .route("/account", get(auth::account))
        .route("/pages/{slug}", get(pages::show))
        .route("/locale", post(pages::set_locale))
}
