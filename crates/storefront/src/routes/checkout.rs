//! Checkout route handler.
//!
//! `placeOrder` turns the current cart into an immutable order. Payment is
//! not captured here: the request carries a payment intent reference that an
//! upstream payment step already authorized.

use axum::{Json, extract::State};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use thockshop_core::OrderId;

use crate::cookies;
use crate::db::carts::{CartOwner, CartRepository};
use crate::db::orders::{CreateOrderInput, OrderError, OrderRepository};
use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::order::ShippingAddress;
use crate::state::AppState;

/// Payment reference from the upstream payment step.
#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub intent_id: String,
}

/// `placeOrder` request body.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub shipping: ShippingAddress,
    pub payment: PaymentInput,
}

/// `placeOrder` success response.
#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub order_number: String,
}

/// `POST /checkout/place-order`
#[instrument(skip_all)]
pub async fn place_order(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    jar: CookieJar,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>> {
    let cart_key = jar
        .get(cookies::CART_SESSION)
        .map(|cookie| cookie.value().to_owned());

    let owner = match (&user, cart_key.as_deref()) {
        (Some(user), _) => CartOwner::User(user.id),
        (None, Some(key)) => CartOwner::Guest(key),
        (None, None) => return Err(OrderError::EmptyCart.into()),
    };

    let cart = CartRepository::new(state.pool())
        .load(owner)
        .await?
        .ok_or(OrderError::EmptyCart)?;

    let order = OrderRepository::new(state.pool())
        .create_from_cart(CreateOrderInput {
            cart: &cart,
            user_id: user.as_ref().map(|user| user.id),
            shipping: request.shipping,
            payment_intent_id: request.payment.intent_id,
        })
        .await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "order placed");

    // Confirmation email is a side effect; a failed send is logged, the
    // order stands.
    if let Err(e) = state
        .mailer()
        .send_order_confirmation(&order.email, &order)
        .await
    {
        tracing::error!(order_id = %order.id, "failed to send order confirmation: {e}");
    }

    Ok(Json(PlaceOrderResponse {
        success: true,
        order_id: order.id,
        order_number: order.order_number,
    }))
}
