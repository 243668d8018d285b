//! Cart repository.
//!
//! CRUD over carts and cart items, the stock guard on add, discount
//! application, and the guest-to-user cart merge performed on login.
//!
//! The stock check and the item insert are separate statements; two
//! concurrent adds racing for the last unit can both pass the check. That is
//! a documented, accepted gap, not an invariant this module defends.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use thockshop_core::{CartId, CartItemId, DiscountId, Money, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::{
    Cart, CartItem, CompositeComponent, canonical_composites,
};

/// Errors from cart operations that a shopper can act on, kept distinct from
/// system errors.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested variant does not exist.
    #[error("variant not found")]
    VariantNotFound,

    /// Requested quantity exceeds what is on hand.
    #[error("only {available} in stock")]
    InsufficientStock {
        requested: i32,
        available: i32,
    },

    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The referenced cart line does not exist in this cart.
    #[error("cart item not found")]
    ItemNotFound,

    /// Discount code missing, inactive, or conditions not met.
    #[error("{0}")]
    InvalidDiscount(String),

    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// The identity a cart hangs off: a logged-in user or the anonymous
/// `cart-session` cookie value.
#[derive(Debug, Clone, Copy)]
pub enum CartOwner<'a> {
    User(UserId),
    Guest(&'a str),
}

/// A discount code row with its conditions.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Discount {
    pub id: DiscountId,
    pub code: String,
    pub description: Option<String>,
    pub amount: Money,
    pub min_subtotal: Option<Money>,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

// =============================================================================
// Pure decision helpers (exercised directly by the unit tests)
// =============================================================================

/// Reject an add/update that would put more of a line in the cart than the
/// variant has on hand.
pub fn ensure_stock(requested: i32, already_in_cart: i32, available: i32) -> Result<(), CartError> {
    if requested < 1 {
        return Err(CartError::InvalidQuantity);
    }
    if requested + already_in_cart > available {
        return Err(CartError::InsufficientStock {
            requested,
            available: (available - already_in_cart).max(0),
        });
    }
    Ok(())
}

/// Check a discount against the cart subtotal and the clock; returns the
/// amount it takes off when applicable.
pub fn discount_amount_if_eligible(
    discount: &Discount,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<Money, CartError> {
    if !discount.active {
        return Err(CartError::InvalidDiscount(
            "this code is no longer active".to_owned(),
        ));
    }
    if let Some(starts_at) = discount.starts_at
        && now < starts_at
    {
        return Err(CartError::InvalidDiscount(
            "this code is not active yet".to_owned(),
        ));
    }
    if let Some(expires_at) = discount.expires_at
        && now >= expires_at
    {
        return Err(CartError::InvalidDiscount("this code has expired".to_owned()));
    }
    if let Some(min_subtotal) = discount.min_subtotal
        && subtotal < min_subtotal
    {
        return Err(CartError::InvalidDiscount(format!(
            "this code requires a minimum subtotal of {min_subtotal}"
        )));
    }
    Ok(discount.amount)
}

/// How guest lines fold into an existing user cart.
#[derive(Debug, Default)]
pub struct MergePlan<'a> {
    /// `(user line, quantity to add)` for guest lines matching an existing
    /// user line.
    pub increments: Vec<(CartItemId, i32)>,
    /// Guest lines with no counterpart; copied over as-is.
    pub appends: Vec<&'a CartItem>,
}

/// Plan the guest-to-user merge: quantities sum on matching
/// variant+composite keys, everything else is appended.
///
/// Planning over an already-merged state (no guest lines) yields an empty
/// plan, which is what makes the merge idempotent once the guest cart has
/// been retired.
#[must_use]
pub fn plan_merge<'a>(user_items: &[CartItem], guest_items: &'a [CartItem]) -> MergePlan<'a> {
    let mut plan = MergePlan::default();

    for guest_item in guest_items {
        match user_items
            .iter()
            .find(|user_item| user_item.same_line(guest_item.variant_id, &guest_item.composites))
        {
            Some(user_item) => plan.increments.push((user_item.id, guest_item.quantity)),
            None => plan.appends.push(guest_item),
        }
    }

    plan
}

// =============================================================================
// Repository
// =============================================================================

/// Database row shape for `carts`.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    session_key: Option<String>,
    discount_code: Option<String>,
    discount_amount: Money,
}

/// Database row shape for `cart_items`.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    variant_id: VariantId,
    product_title: String,
    variant_title: String,
    quantity: i32,
    price: Money,
    composites: Json<Vec<CompositeComponent>>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            variant_id: row.variant_id,
            product_title: row.product_title,
            variant_title: row.variant_title,
            quantity: row.quantity,
            price: row.price,
            composites: row.composites.0,
        }
    }
}

/// Line info needed to add a variant to a cart.
#[derive(Debug, sqlx::FromRow)]
struct VariantLineRow {
    variant_id: VariantId,
    product_title: String,
    variant_title: String,
    price: Money,
    stock_quantity: i32,
}

const CART_COLUMNS: &str = "id, user_id, session_key, discount_code, discount_amount";
const ITEM_COLUMNS: &str =
    "id, cart_id, variant_id, product_title, variant_title, quantity, price, composites";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the cart for an identity, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn load(&self, owner: CartOwner<'_>) -> Result<Option<Cart>, CartError> {
        let row: Option<CartRow> = match owner {
            CartOwner::User(user_id) => {
                sqlx::query_as(&format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"))
                    .bind(user_id)
                    .fetch_optional(self.pool)
                    .await?
            }
            CartOwner::Guest(session_key) => {
                sqlx::query_as(&format!(
                    "SELECT {CART_COLUMNS} FROM carts WHERE session_key = $1"
                ))
                .bind(session_key)
                .fetch_optional(self.pool)
                .await?
            }
        };

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(self.hydrate(row).await?))
    }

    /// Load the cart for an identity, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn get_or_create(&self, owner: CartOwner<'_>) -> Result<Cart, CartError> {
        if let Some(cart) = self.load(owner).await? {
            return Ok(cart);
        }

        let row: CartRow = match owner {
            CartOwner::User(user_id) => {
                sqlx::query_as(&format!(
                    "INSERT INTO carts (user_id) VALUES ($1) \
                     ON CONFLICT (user_id) DO UPDATE SET updated_at = now() \
                     RETURNING {CART_COLUMNS}"
                ))
                .bind(user_id)
                .fetch_one(self.pool)
                .await?
            }
            CartOwner::Guest(session_key) => {
                sqlx::query_as(&format!(
                    "INSERT INTO carts (session_key) VALUES ($1) \
                     ON CONFLICT (session_key) DO UPDATE SET updated_at = now() \
                     RETURNING {CART_COLUMNS}"
                ))
                .bind(session_key)
                .fetch_one(self.pool)
                .await?
            }
        };

        self.hydrate(row).await
    }

    /// Add a variant (optionally with bundle components) to the cart.
    ///
    /// The variant's current stock is read first; a request that would put
    /// more of this line in the cart than is on hand is rejected outright,
    /// and a rejected first add leaves no cart row behind. An identical line
    /// (same variant, same composite set) has its quantity incremented
    /// instead of being duplicated. Unit price is snapshotted at add time.
    ///
    /// # Errors
    ///
    /// `CartError::VariantNotFound`, `CartError::InvalidQuantity`,
    /// `CartError::InsufficientStock`, or `CartError::Repository`.
    pub async fn add_item(
        &self,
        owner: CartOwner<'_>,
        variant_id: VariantId,
        quantity: i32,
        composite_ids: &[VariantId],
    ) -> Result<Cart, CartError> {
        let line = self.load_variant_line(variant_id).await?;
        let components = self.load_components(composite_ids).await?;
        let unit_price = components
            .iter()
            .fold(line.price, |acc, c| acc + c.price);

        // Stock guard runs before any cart row is created.
        let existing = self.load(owner).await?;
        let already_in_cart = existing
            .as_ref()
            .and_then(|cart| {
                cart.items
                    .iter()
                    .find(|item| item.same_line(variant_id, &components))
                    .map(|item| item.quantity)
            })
            .unwrap_or(0);
        ensure_stock(quantity, already_in_cart, line.stock_quantity)?;

        let cart = match existing {
            Some(cart) => cart,
            None => self.get_or_create(owner).await?,
        };

        let matching = cart
            .items
            .iter()
            .find(|item| item.same_line(variant_id, &components));

        match matching {
            Some(item) => {
                sqlx::query("UPDATE cart_items SET quantity = quantity + $1 WHERE id = $2")
                    .bind(quantity)
                    .bind(item.id)
                    .execute(self.pool)
                    .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO cart_items \
                     (cart_id, variant_id, product_title, variant_title, quantity, price, composites) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                )
                .bind(cart.id)
                .bind(variant_id)
                .bind(&line.product_title)
                .bind(&line.variant_title)
                .bind(quantity)
                .bind(unit_price)
                .bind(Json(&components))
                .execute(self.pool)
                .await?;
            }
        }

        self.touch(cart.id).await?;
        self.require(owner).await
    }

    /// Set the quantity of an existing line, re-checking stock.
    ///
    /// # Errors
    ///
    /// `CartError::ItemNotFound`, `CartError::InvalidQuantity`,
    /// `CartError::InsufficientStock`, or `CartError::Repository`.
    pub async fn update_item_quantity(
        &self,
        owner: CartOwner<'_>,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        let cart = self.require(owner).await?;
        let item = cart
            .items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or(CartError::ItemNotFound)?;

        let line = self.load_variant_line(item.variant_id).await?;
        ensure_stock(quantity, 0, line.stock_quantity)?;

        sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2 AND cart_id = $3")
            .bind(quantity)
            .bind(item_id)
            .bind(cart.id)
            .execute(self.pool)
            .await?;

        self.touch(cart.id).await?;
        self.require(owner).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// `CartError::ItemNotFound` or `CartError::Repository`.
    pub async fn remove_item(
        &self,
        owner: CartOwner<'_>,
        item_id: CartItemId,
    ) -> Result<Cart, CartError> {
        let cart = self.require(owner).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart.id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CartError::ItemNotFound);
        }

        self.touch(cart.id).await?;
        self.require(owner).await
    }

    /// Remove every line and any applied discount.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn clear(&self, owner: CartOwner<'_>) -> Result<(), CartError> {
        let Some(cart) = self.load(owner).await? else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE carts SET discount_code = NULL, discount_amount = 0, updated_at = now() \
             WHERE id = $1",
        )
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await.map_err(RepositoryError::Database)?;

        Ok(())
    }

    /// Apply a discount code to the cart.
    ///
    /// Conditions (active flag, date window, minimum subtotal) are evaluated
    /// server-side; violations surface as `CartError::InvalidDiscount`,
    /// distinguishable from system errors.
    ///
    /// # Errors
    ///
    /// `CartError::InvalidDiscount` or `CartError::Repository`.
    pub async fn apply_discount(
        &self,
        owner: CartOwner<'_>,
        code: &str,
    ) -> Result<Cart, CartError> {
        let cart = self.require(owner).await?;
        if cart.items.is_empty() {
            return Err(CartError::InvalidDiscount(
                "add something to your cart first".to_owned(),
            ));
        }

        let normalized = code.trim().to_uppercase();
        let discount: Option<Discount> = sqlx::query_as(
            "SELECT id, code, description, amount, min_subtotal, starts_at, expires_at, active \
             FROM discounts WHERE code = $1",
        )
        .bind(&normalized)
        .fetch_optional(self.pool)
        .await?;

        let discount = discount
            .ok_or_else(|| CartError::InvalidDiscount("unknown discount code".to_owned()))?;

        let subtotal: Money = cart
            .items
            .iter()
            .map(|item| item.price.times(u32::try_from(item.quantity).unwrap_or(0)))
            .sum();
        let amount = discount_amount_if_eligible(&discount, subtotal, Utc::now())?;

        sqlx::query(
            "UPDATE carts SET discount_code = $1, discount_amount = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(&discount.code)
        .bind(amount)
        .bind(cart.id)
        .execute(self.pool)
        .await?;

        self.require(owner).await
    }

    /// Remove any applied discount.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn remove_discount(&self, owner: CartOwner<'_>) -> Result<Cart, CartError> {
        let cart = self.require(owner).await?;

        sqlx::query(
            "UPDATE carts SET discount_code = NULL, discount_amount = 0, updated_at = now() \
             WHERE id = $1",
        )
        .bind(cart.id)
        .execute(self.pool)
        .await?;

        self.require(owner).await
    }

    /// Fold the anonymous cart identified by `session_key` into the user's
    /// cart, then retire the anonymous cart.
    ///
    /// Safe to call more than once for the same login (OAuth callbacks can
    /// re-enter): once the guest cart is gone, subsequent calls find nothing
    /// to merge and return without touching the user cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on database failure.
    pub async fn merge_guest_cart_on_login(
        &self,
        session_key: &str,
        user_id: UserId,
    ) -> Result<(), CartError> {
        let Some(guest_cart) = self.load(CartOwner::Guest(session_key)).await? else {
            return Ok(());
        };

        if guest_cart.items.is_empty() && guest_cart.discount_code.is_none() {
            // Nothing worth keeping; just retire the row.
            sqlx::query("DELETE FROM carts WHERE id = $1")
                .bind(guest_cart.id)
                .execute(self.pool)
                .await?;
            return Ok(());
        }

        let user_cart = self.get_or_create(CartOwner::User(user_id)).await?;
        let plan = plan_merge(&user_cart.items, &guest_cart.items);

        let mut tx = self.pool.begin().await.map_err(RepositoryError::Database)?;

        for (item_id, add_quantity) in &plan.increments {
            sqlx::query("UPDATE cart_items SET quantity = quantity + $1 WHERE id = $2")
                .bind(add_quantity)
                .bind(*item_id)
                .execute(&mut *tx)
                .await?;
        }

        for guest_item in &plan.appends {
            sqlx::query(
                "INSERT INTO cart_items \
                 (cart_id, variant_id, product_title, variant_title, quantity, price, composites) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(user_cart.id)
            .bind(guest_item.variant_id)
            .bind(&guest_item.product_title)
            .bind(&guest_item.variant_title)
            .bind(guest_item.quantity)
            .bind(guest_item.price)
            .bind(Json(&guest_item.composites))
            .execute(&mut *tx)
            .await?;
        }

        // The user's own discount wins; adopt the guest's only when the user
        // cart has none.
        if user_cart.discount_code.is_none()
            && let Some(guest_code) = &guest_cart.discount_code
        {
            sqlx::query(
                "UPDATE carts SET discount_code = $1, discount_amount = $2, updated_at = now() \
                 WHERE id = $3",
            )
            .bind(guest_code)
            .bind(guest_cart.discount_amount)
            .bind(user_cart.id)
            .execute(&mut *tx)
            .await?;
        }

        // Retiring the guest cart is what makes re-running the merge a no-op.
        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(guest_cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(RepositoryError::Database)?;
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require(&self, owner: CartOwner<'_>) -> Result<Cart, CartError> {
        self.load(owner)
            .await?
            .ok_or(CartError::Repository(RepositoryError::NotFound))
    }

    async fn hydrate(&self, row: CartRow) -> Result<Cart, CartError> {
        let items: Vec<CartItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 ORDER BY id"
        ))
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        Ok(Cart {
            id: row.id,
            user_id: row.user_id,
            session_key: row.session_key,
            discount_code: row.discount_code,
            discount_amount: row.discount_amount,
            items: items.into_iter().map(CartItem::from).collect(),
        })
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), CartError> {
        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    async fn load_variant_line(&self, variant_id: VariantId) -> Result<VariantLineRow, CartError> {
        let line: Option<VariantLineRow> = sqlx::query_as(
            "SELECT v.id AS variant_id, p.title AS product_title, v.title AS variant_title, \
                    v.price, v.stock_quantity \
             FROM product_variants v JOIN products p ON p.id = v.product_id \
             WHERE v.id = $1",
        )
        .bind(variant_id)
        .fetch_optional(self.pool)
        .await?;

        line.ok_or(CartError::VariantNotFound)
    }

    async fn load_components(
        &self,
        composite_ids: &[VariantId],
    ) -> Result<Vec<CompositeComponent>, CartError> {
        if composite_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = composite_ids.iter().map(|id| id.as_i32()).collect();
        let rows: Vec<VariantLineRow> = sqlx::query_as(
            "SELECT v.id AS variant_id, p.title AS product_title, v.title AS variant_title, \
                    v.price, v.stock_quantity \
             FROM product_variants v JOIN products p ON p.id = v.product_id \
             WHERE v.id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        if rows.len() != composite_ids.len() {
            return Err(CartError::VariantNotFound);
        }

        Ok(canonical_composites(
            rows.into_iter()
                .map(|row| CompositeComponent {
                    variant_id: row.variant_id,
                    title: format!("{} - {}", row.product_title, row.variant_title),
                    price: row.price,
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ensure_stock_rejects_over_ask() {
        let err = ensure_stock(3, 0, 2).unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 3,
                available: 2
            }
        ));
    }

    #[test]
    fn test_ensure_stock_counts_what_is_already_carted() {
        assert!(ensure_stock(1, 1, 2).is_ok());
        let err = ensure_stock(2, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn test_ensure_stock_boundary_and_bad_quantity() {
        // Taking exactly the remaining stock is allowed
        assert!(ensure_stock(2, 0, 2).is_ok());
        assert!(matches!(
            ensure_stock(0, 0, 10),
            Err(CartError::InvalidQuantity)
        ));
        assert!(matches!(
            ensure_stock(-1, 0, 10),
            Err(CartError::InvalidQuantity)
        ));
    }

    fn discount(amount_cents: i64) -> Discount {
        Discount {
            id: DiscountId::new(1),
            code: "WELCOME".to_owned(),
            description: None,
            amount: Money::from_cents(amount_cents),
            min_subtotal: None,
            starts_at: None,
            expires_at: None,
            active: true,
        }
    }

    #[test]
    fn test_discount_eligible() {
        let amount =
            discount_amount_if_eligible(&discount(500), Money::from_cents(2000), Utc::now())
                .unwrap();
        assert_eq!(amount, Money::from_cents(500));
    }

    #[test]
    fn test_discount_inactive_rejected() {
        let mut d = discount(500);
        d.active = false;
        assert!(matches!(
            discount_amount_if_eligible(&d, Money::from_cents(2000), Utc::now()),
            Err(CartError::InvalidDiscount(_))
        ));
    }

    #[test]
    fn test_discount_window_enforced() {
        let now = Utc::now();

        let mut not_yet = discount(500);
        not_yet.starts_at = Some(now + Duration::days(1));
        assert!(discount_amount_if_eligible(&not_yet, Money::from_cents(2000), now).is_err());

        let mut expired = discount(500);
        expired.expires_at = Some(now - Duration::days(1));
        assert!(discount_amount_if_eligible(&expired, Money::from_cents(2000), now).is_err());
    }

    #[test]
    fn test_discount_min_subtotal_enforced() {
        let mut d = discount(500);
        d.min_subtotal = Some(Money::from_cents(5000));
        assert!(discount_amount_if_eligible(&d, Money::from_cents(2000), Utc::now()).is_err());
        assert!(discount_amount_if_eligible(&d, Money::from_cents(5000), Utc::now()).is_ok());
    }

    fn item(id: i32, variant: i32, quantity: i32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            variant_id: VariantId::new(variant),
            product_title: "Linear Switches".to_owned(),
            variant_title: "70 pack".to_owned(),
            quantity,
            price: Money::from_cents(3500),
            composites: Vec::new(),
        }
    }

    #[test]
    fn test_plan_merge_sums_matching_lines_and_appends_rest() {
        let user_items = vec![item(1, 10, 2)];
        let guest_items = vec![item(2, 10, 3), item(3, 20, 1)];

        let plan = plan_merge(&user_items, &guest_items);
        assert_eq!(plan.increments, vec![(CartItemId::new(1), 3)]);
        assert_eq!(plan.appends.len(), 1);
        assert_eq!(plan.appends[0].variant_id, VariantId::new(20));
    }

    #[test]
    fn test_plan_merge_distinguishes_composite_sets() {
        let mut bundled = item(1, 10, 1);
        bundled.composites = vec![CompositeComponent {
            variant_id: VariantId::new(99),
            title: "Keycaps - MT3".to_owned(),
            price: Money::from_cents(9900),
        }];
        let user_items = vec![item(2, 10, 1)];

        // Same variant but a different composite set must not collapse
        let plan = plan_merge(&user_items, std::slice::from_ref(&bundled));
        assert!(plan.increments.is_empty());
        assert_eq!(plan.appends.len(), 1);
    }

    #[test]
    fn test_plan_merge_idempotent_once_guest_side_is_empty() {
        // After a merge the guest cart is deleted; replanning against the
        // merged user cart with no guest lines must be a no-op.
        let user_items = vec![item(1, 10, 5), item(2, 20, 1)];
        let plan = plan_merge(&user_items, &[]);
        assert!(plan.increments.is_empty());
        assert!(plan.appends.is_empty());
    }
}
