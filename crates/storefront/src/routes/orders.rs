//! Order history route handlers.
//!
//! All reads go through the repository's ownership-checked paths; a foreign
//! order is indistinguishable from a missing one.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use thockshop_core::{Money, OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::cart::CompositeComponent;
use crate::models::order::{Order, OrderItem, ShippingAddress};
use crate::state::AppState;

/// Query parameters for the order list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// Body for a status transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// An order as returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub shipping: ShippingAddress,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
}

/// An order line as returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product_title: String,
    pub variant_title: String,
    pub quantity: i32,
    pub price: Money,
    pub line_total: Money,
    pub composites: Vec<CompositeComponent>,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_title: item.product_title.clone(),
            variant_title: item.variant_title.clone(),
            quantity: item.quantity,
            price: item.price,
            line_total: item.price.times(u32::try_from(item.quantity).unwrap_or(0)),
            composites: item.composites.clone(),
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            subtotal: order.subtotal,
            discount_amount: order.discount_amount,
            total: order.total,
            shipping: order.shipping.clone(),
            items: order.items.iter().map(OrderItemView::from).collect(),
            created_at: order.created_at,
        }
    }
}

/// `GET /orders`
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OrderView>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(&user, query.limit)
        .await?;

    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

/// `GET /orders/{id}`
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<OrderView>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(OrderId::new(id), &user)
        .await?;

    Ok(Json(OrderView::from(&order)))
}

/// `POST /orders/{id}/status`
///
/// Status transitions are operational actions (payment confirmation,
/// fulfilment), restricted to admins and validated against the transition
/// table.
#[instrument(skip(state, user))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<OrderView>> {
    if !user.is_admin {
        return Err(AppError::Unauthorized("admin only".to_owned()));
    }

    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), request.status)
        .await?;

    Ok(Json(OrderView::from(&order)))
}
