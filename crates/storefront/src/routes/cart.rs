//! Cart route handlers.
//!
//! Form actions over the cart: add, update, remove, discount, clear. Every
//! response carries the recomputed [`CartView`]. Anonymous shoppers are keyed
//! by the `cart-session` cookie, which is minted on the first mutating call;
//! logged-in shoppers are keyed by their user id.

use axum::{Form, Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::instrument;

use thockshop_core::{CartItemId, VariantId};

use crate::cookies;
use crate::db::carts::{CartOwner, CartRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::cart::CartView;
use crate::models::session::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Form types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub variant_id: i32,
    pub quantity: Option<i32>,
    /// Comma-separated variant ids of bundle components.
    pub composites: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    pub item_id: i32,
    pub quantity: i32,
}

/// Remove item form data.
#[derive(Debug, Deserialize)]
pub struct RemoveItemForm {
    pub item_id: i32,
}

/// Apply discount form data.
#[derive(Debug, Deserialize)]
pub struct ApplyDiscountForm {
    pub code: String,
}

fn parse_composites(raw: Option<&str>) -> Result<Vec<VariantId>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i32>()
                .map(VariantId::new)
                .map_err(|_| AppError::BadRequest(format!("invalid component id: {part}")))
        })
        .collect()
}

/// Pick the cart identity for this request: the user when logged in, the
/// cart-session key otherwise.
fn owner<'a>(user: Option<&CurrentUser>, cart_key: &'a str) -> CartOwner<'a> {
    user.map_or(CartOwner::Guest(cart_key), |user| CartOwner::User(user.id))
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /cart`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
) -> Result<Json<CartView>> {
    let repo = CartRepository::new(state.pool());

    let cart = match (&user, jar.get(cookies::CART_SESSION)) {
        (Some(user), _) => repo.load(CartOwner::User(user.id)).await?,
        (None, Some(cookie)) => repo.load(CartOwner::Guest(cookie.value())).await?,
        (None, None) => None,
    };

    Ok(Json(
        cart.as_ref().map_or_else(CartView::empty, CartView::from_cart),
    ))
}

/// `POST /cart/add`
#[instrument(skip(state, user, jar, form), fields(variant_id = form.variant_id))]
pub async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
    Form(form): Form<AddItemForm>,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());
    let composites = parse_composites(form.composites.as_deref())?;

    let cart = CartRepository::new(state.pool())
        .add_item(
            owner(user.as_ref(), &cart_key),
            VariantId::new(form.variant_id),
            form.quantity.unwrap_or(1),
            &composites,
        )
        .await?;

    Ok((jar, Json(CartView::from_cart(&cart))))
}

/// `POST /cart/update`
#[instrument(skip(state, user, jar, form), fields(item_id = form.item_id))]
pub async fn update_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
    Form(form): Form<UpdateItemForm>,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());

    let cart = CartRepository::new(state.pool())
        .update_item_quantity(
            owner(user.as_ref(), &cart_key),
            CartItemId::new(form.item_id),
            form.quantity,
        )
        .await?;

    Ok((jar, Json(CartView::from_cart(&cart))))
}

/// `POST /cart/remove`
#[instrument(skip(state, user, jar, form), fields(item_id = form.item_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
    Form(form): Form<RemoveItemForm>,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());

    let cart = CartRepository::new(state.pool())
        .remove_item(owner(user.as_ref(), &cart_key), CartItemId::new(form.item_id))
        .await?;

    Ok((jar, Json(CartView::from_cart(&cart))))
}

/// `POST /cart/discount`
#[instrument(skip_all)]
pub async fn apply_discount(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
    Form(form): Form<ApplyDiscountForm>,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());

    let cart = CartRepository::new(state.pool())
        .apply_discount(owner(user.as_ref(), &cart_key), &form.code)
        .await?;

    Ok((jar, Json(CartView::from_cart(&cart))))
}

/// `POST /cart/discount/remove`
#[instrument(skip_all)]
pub async fn remove_discount(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());

    let cart = CartRepository::new(state.pool())
        .remove_discount(owner(user.as_ref(), &cart_key))
        .await?;

    Ok((jar, Json(CartView::from_cart(&cart))))
}

/// `POST /cart/clear`
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CartView>)> {
    let (jar, cart_key) = cookies::ensure_cart_session(jar, state.config().cookies_secure());

    CartRepository::new(state.pool())
        .clear(owner(user.as_ref(), &cart_key))
        .await?;

    Ok((jar, Json(CartView::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_composites() {
        assert_eq!(parse_composites(None).unwrap(), Vec::<VariantId>::new());
        assert_eq!(
            parse_composites(Some("3, 1,7")).unwrap(),
            vec![VariantId::new(3), VariantId::new(1), VariantId::new(7)]
        );
        assert_eq!(parse_composites(Some("")).unwrap(), Vec::<VariantId>::new());
        assert!(parse_composites(Some("1,abc")).is_err());
    }
}
