//! Order repository.
//!
//! Orders are immutable snapshots created from a cart at checkout. Ownership
//! checks live here, not in the route handlers, so every caller gets them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use thockshop_core::{Email, Money, OrderId, OrderItemId, OrderStatus, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::{Cart, CompositeComponent};
use crate::models::order::{Order, OrderItem, ShippingAddress, order_number};
use crate::models::session::CurrentUser;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// Shipping address failed validation; field-level messages attached.
    #[error("shipping address is incomplete")]
    InvalidAddress(Vec<(&'static str, &'static str)>),

    /// Missing or blank payment reference.
    #[error("payment reference is missing")]
    MissingPayment,

    /// Order does not exist, or the requester does not own it.
    #[error("order not found")]
    NotFound,

    /// Illegal status transition.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Everything checkout hands the repository to cut an order.
#[derive(Debug)]
pub struct CreateOrderInput<'a> {
    /// The cart being snapshotted.
    pub cart: &'a Cart,
    /// The logged-in user, if any (guest checkout carries only the email).
    pub user_id: Option<UserId>,
    pub shipping: ShippingAddress,
    /// Reference to the already-authorized payment from the upstream payment
    /// step. No capture happens here.
    pub payment_intent_id: String,
}

/// Database row shape for `orders`.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: Option<UserId>,
    email: String,
    status: String,
    subtotal: Money,
    discount_amount: Money,
    total: Money,
    payment_intent_id: String,
    ship_name: String,
    ship_email: String,
    ship_line1: String,
    ship_line2: Option<String>,
    ship_city: String,
    ship_postal_code: String,
    ship_country: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_domain(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid order status: {e}")))?;

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            email,
            status,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            total: self.total,
            payment_intent_id: self.payment_intent_id,
            shipping: ShippingAddress {
                name: self.ship_name,
                email: self.ship_email,
                line1: self.ship_line1,
                line2: self.ship_line2,
                city: self.ship_city,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Database row shape for `order_items`.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    variant_id: VariantId,
    product_title: String,
    variant_title: String,
    quantity: i32,
    price: Money,
    composites: Json<Vec<CompositeComponent>>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            variant_id: row.variant_id,
            product_title: row.product_title,
            variant_title: row.variant_title,
            quantity: row.quantity,
            price: row.price,
            composites: row.composites.0,
        }
    }
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, email, status, subtotal, \
    discount_amount, total, payment_intent_id, ship_name, ship_email, ship_line1, ship_line2, \
    ship_city, ship_postal_code, ship_country, created_at, updated_at";
const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, variant_id, product_title, variant_title, quantity, price, composites";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order from a cart.
    ///
    /// Validates the shipping address and payment reference, freezes the
    /// cart's line items into order rows, derives the human-readable order
    /// number from the creation date and a short hash of the order id, and
    /// empties the cart, all in one transaction. Sending the confirmation
    /// email is the caller's follow-up and never rolls this back.
    ///
    /// # Errors
    ///
    /// `OrderError::InvalidAddress`, `OrderError::EmptyCart`,
    /// `OrderError::MissingPayment`, or `OrderError::Repository`.
    pub async fn create_from_cart(
        &self,
        input: CreateOrderInput<'_>,
    ) -> Result<Order, OrderError> {
        let missing = input.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::InvalidAddress(missing));
        }
        if input.cart.items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if input.payment_intent_id.trim().is_empty() {
            return Err(OrderError::MissingPayment);
        }

        let subtotal: Money = input
            .cart
            .items
            .iter()
            .map(|item| item.price.times(u32::try_from(item.quantity).unwrap_or(0)))
            .sum();
        let discount_amount = if input.cart.discount_code.is_some() {
            input.cart.discount_amount
        } else {
            Money::ZERO
        };
        let total = subtotal.saturating_sub(discount_amount);
        let email = Email::parse(&input.shipping.email).map_err(|_| {
            OrderError::InvalidAddress(vec![("email", "a valid email address is required")])
        })?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        #[derive(sqlx::FromRow)]
        struct Inserted {
            id: OrderId,
            created_at: DateTime<Utc>,
        }

        let inserted: Inserted = sqlx::query_as(
            "INSERT INTO orders \
             (order_number, user_id, email, status, subtotal, discount_amount, total, \
              payment_intent_id, ship_name, ship_email, ship_line1, ship_line2, ship_city, \
              ship_postal_code, ship_country) \
             VALUES ('', $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id, created_at",
        )
        .bind(input.user_id)
        .bind(email.as_str())
        .bind(OrderStatus::PendingPayment.as_str())
        .bind(subtotal)
        .bind(discount_amount)
        .bind(total)
        .bind(&input.payment_intent_id)
        .bind(&input.shipping.name)
        .bind(&input.shipping.email)
        .bind(&input.shipping.line1)
        .bind(&input.shipping.line2)
        .bind(&input.shipping.city)
        .bind(&input.shipping.postal_code)
        .bind(&input.shipping.country)
        .fetch_one(&mut *tx)
        .await?;

        // The number needs the generated id, so it is filled in right after.
        let number = order_number(inserted.created_at, inserted.id);
        sqlx::query("UPDATE orders SET order_number = $1 WHERE id = $2")
            .bind(&number)
            .bind(inserted.id)
            .execute(&mut *tx)
            .await?;

        for item in &input.cart.items {
            sqlx::query(
                "INSERT INTO order_items \
                 (order_id, variant_id, product_title, variant_title, quantity, price, composites) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(inserted.id)
            .bind(item.variant_id)
            .bind(&item.product_title)
            .bind(&item.variant_title)
            .bind(item.quantity)
            .bind(item.price)
            .bind(Json(&item.composites))
            .execute(&mut *tx)
            .await?;
        }

        // The cart has served its purpose.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(input.cart.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE carts SET discount_code = NULL, discount_amount = 0, updated_at = now() \
             WHERE id = $1",
        )
        .bind(input.cart.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(RepositoryError::Database)?;

        self.get(inserted.id).await
    }

    /// Fetch an order by id with no ownership check. Internal and CLI use.
    ///
    /// # Errors
    ///
    /// `OrderError::NotFound` or `OrderError::Repository`.
    pub async fn get(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id)
                .fetch_optional(self.pool)
                .await?;

        let row = row.ok_or(OrderError::NotFound)?;
        let items = self.items_for(order_id).await?;
        row.into_domain(items).map_err(OrderError::Repository)
    }

    /// Fetch an order on behalf of a requester, enforcing ownership.
    ///
    /// The order must belong to the user (matching `user_id`) or carry the
    /// requester's email in its shipping address. A foreign order reads as
    /// not-found so its existence is not leaked.
    ///
    /// # Errors
    ///
    /// `OrderError::NotFound` or `OrderError::Repository`.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        requester: &CurrentUser,
    ) -> Result<Order, OrderError> {
        let order = self.get(order_id).await?;

        let owns_by_id = order.user_id == Some(requester.id);
        let owns_by_email = order.email == requester.email;
        if !owns_by_id && !owns_by_email {
            return Err(OrderError::NotFound);
        }

        Ok(order)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on database failure.
    pub async fn list_for_user(
        &self,
        requester: &CurrentUser,
        limit: Option<i64>,
    ) -> Result<Vec<Order>, OrderError> {
        let limit = limit.unwrap_or(20).clamp(1, 100);

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 OR email = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        ))
        .bind(requester.id)
        .bind(requester.email.as_str())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(row.into_domain(items).map_err(OrderError::Repository)?);
        }
        Ok(orders)
    }

    /// Move an order to a new status, honoring the transition table.
    ///
    /// # Errors
    ///
    /// `OrderError::InvalidTransition`, `OrderError::NotFound`, or
    /// `OrderError::Repository`.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self.get(order_id).await?;

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        sqlx::query("UPDATE orders SET status = $1, updated_at = now() WHERE id = $2")
            .bind(next.as_str())
            .bind(order_id)
            .execute(self.pool)
            .await?;

        self.get(order_id).await
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }
}
