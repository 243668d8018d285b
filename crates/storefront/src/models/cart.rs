//! Cart domain types and view models.

use serde::{Deserialize, Serialize};

use thockshop_core::{CartId, CartItemId, Money, UserId, VariantId};

/// A shopping cart.
///
/// Exactly one live cart exists per identity key: either a `user_id` (after
/// login) or an anonymous `session_key` (the `cart-session` cookie value).
/// The anonymous cart is merged into the user's cart on login and then
/// deleted.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub session_key: Option<String>,
    /// Applied discount code, if any.
    pub discount_code: Option<String>,
    /// Amount the applied discount takes off the subtotal.
    pub discount_amount: Money,
    pub items: Vec<CartItem>,
}

/// A line item in a cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub variant_id: VariantId,
    /// Product title snapshot taken at add time.
    pub product_title: String,
    /// Variant title snapshot taken at add time.
    pub variant_title: String,
    pub quantity: i32,
    /// Unit price snapshot taken at add time (base variant plus components).
    pub price: Money,
    /// Bundle components attached to this line (e.g. the switches and keycaps
    /// sold with a keyboard). Stored in canonical order.
    pub composites: Vec<CompositeComponent>,
}

impl CartItem {
    /// Whether this line holds the same merchandise as
    /// `(variant_id, composites)`: same variant and the same composite set,
    /// regardless of component order.
    #[must_use]
    pub fn same_line(&self, variant_id: VariantId, composites: &[CompositeComponent]) -> bool {
        self.variant_id == variant_id && composites_match(&self.composites, composites)
    }
}

/// A component of a composite line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeComponent {
    pub variant_id: VariantId,
    pub title: String,
    pub price: Money,
}

/// Sort components into the canonical order used for storage and matching.
#[must_use]
pub fn canonical_composites(mut components: Vec<CompositeComponent>) -> Vec<CompositeComponent> {
    components.sort_by_key(|c| c.variant_id);
    components
}

/// Whether two composite sets contain the same components, order-insensitive.
#[must_use]
pub fn composites_match(a: &[CompositeComponent], b: &[CompositeComponent]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&CompositeComponent> = a.iter().collect();
    let mut right: Vec<&CompositeComponent> = b.iter().collect();
    left.sort_by_key(|c| c.variant_id);
    right.sort_by_key(|c| c.variant_id);
    left.iter().zip(&right).all(|(x, y)| x == y)
}

// =============================================================================
// View model
// =============================================================================

/// Read-only cart projection returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Money,
    pub discount_code: Option<String>,
    pub discount_amount: Money,
    pub total: Money,
    pub item_count: u32,
}

/// A line item as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_title: String,
    pub quantity: i32,
    pub price: Money,
    pub line_total: Money,
    pub composites: Vec<CompositeComponent>,
}

impl CartView {
    /// An empty cart (no cookie, or nothing added yet).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            subtotal: Money::ZERO,
            discount_code: None,
            discount_amount: Money::ZERO,
            total: Money::ZERO,
            item_count: 0,
        }
    }

    /// Project a cart into its view, computing subtotal, total and count.
    ///
    /// `total = subtotal - discount_amount`, floored at zero.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        let items: Vec<CartItemView> = cart.items.iter().map(CartItemView::from).collect();
        let subtotal: Money = items.iter().map(|i| i.line_total).sum();
        let item_count = cart
            .items
            .iter()
            .map(|i| u32::try_from(i.quantity).unwrap_or(0))
            .sum();
        let discount_amount = if cart.discount_code.is_some() {
            cart.discount_amount
        } else {
            Money::ZERO
        };

        Self {
            items,
            subtotal,
            discount_code: cart.discount_code.clone(),
            discount_amount,
            total: subtotal.saturating_sub(discount_amount),
            item_count,
        }
    }
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let quantity = u32::try_from(item.quantity).unwrap_or(0);
        Self {
            id: item.id,
            variant_id: item.variant_id,
            product_title: item.product_title.clone(),
            variant_title: item.variant_title.clone(),
            quantity: item.quantity,
            price: item.price,
            line_total: item.price.times(quantity),
            composites: item.composites.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, variant: i32, quantity: i32, cents: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            variant_id: VariantId::new(variant),
            product_title: "Tactile75 Keyboard".to_owned(),
            variant_title: "Default".to_owned(),
            quantity,
            price: Money::from_cents(cents),
            composites: Vec::new(),
        }
    }

    fn component(variant: i32) -> CompositeComponent {
        CompositeComponent {
            variant_id: VariantId::new(variant),
            title: format!("component {variant}"),
            price: Money::from_cents(100),
        }
    }

    fn cart(items: Vec<CartItem>) -> Cart {
        Cart {
            id: CartId::new(1),
            user_id: None,
            session_key: Some("key".to_owned()),
            discount_code: None,
            discount_amount: Money::ZERO,
            items,
        }
    }

    #[test]
    fn test_empty_cart_view() {
        let view = CartView::from_cart(&cart(Vec::new()));
        assert_eq!(view.subtotal, Money::ZERO);
        assert_eq!(view.total, Money::ZERO);
        assert_eq!(view.item_count, 0);
    }

    #[test]
    fn test_view_totals_two_units() {
        // addItem(variant, qty=2, price=10.00) => subtotal 20.00, count 2
        let view = CartView::from_cart(&cart(vec![item(1, 7, 2, 1000)]));
        assert_eq!(view.subtotal, Money::from_cents(2000));
        assert_eq!(view.total, Money::from_cents(2000));
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_view_discount_applied_and_removed() {
        let mut c = cart(vec![item(1, 7, 2, 1000)]);
        c.discount_code = Some("WELCOME".to_owned());
        c.discount_amount = Money::from_cents(500);

        let view = CartView::from_cart(&c);
        assert_eq!(view.total, Money::from_cents(1500));

        c.discount_code = None;
        let view = CartView::from_cart(&c);
        assert_eq!(view.total, Money::from_cents(2000));
    }

    #[test]
    fn test_view_discount_floors_at_zero() {
        let mut c = cart(vec![item(1, 7, 1, 300)]);
        c.discount_code = Some("BIG".to_owned());
        c.discount_amount = Money::from_cents(9000);

        let view = CartView::from_cart(&c);
        assert_eq!(view.total, Money::ZERO);
    }

    #[test]
    fn test_composites_match_is_order_insensitive() {
        let a = vec![component(1), component(2)];
        let b = vec![component(2), component(1)];
        assert!(composites_match(&a, &b));
        assert!(!composites_match(&a, &[component(1)]));
        assert!(!composites_match(&a, &[component(1), component(3)]));
    }

    #[test]
    fn test_same_line_requires_variant_and_composites() {
        let mut line = item(1, 7, 1, 1000);
        line.composites = vec![component(1), component(2)];

        assert!(line.same_line(VariantId::new(7), &[component(2), component(1)]));
        assert!(!line.same_line(VariantId::new(8), &line.composites.clone()));
        assert!(!line.same_line(VariantId::new(7), &[component(1)]));
    }

    #[test]
    fn test_canonical_composites_sorts_by_variant() {
        let canonical = canonical_composites(vec![component(3), component(1), component(2)]);
        let ids: Vec<i32> = canonical.iter().map(|c| c.variant_id.as_i32()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
