//! Order domain types.
//!
//! An order is an immutable snapshot of a cart at checkout. Prices, titles
//! and quantities are frozen into the order rows, so later catalogue changes
//! never affect order history. Only [`thockshop_core::OrderStatus`] moves
//! after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use thockshop_core::{Email, Money, OrderId, OrderItemId, OrderStatus, UserId, VariantId};

use super::cart::CompositeComponent;

/// An order with its frozen line items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable order reference, e.g. `TS-20260806-3FA9C1`.
    pub order_number: String,
    /// Owner, when the order was placed by a logged-in user.
    pub user_id: Option<UserId>,
    /// Contact email (also the ownership key for guest orders).
    pub email: Email,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
    /// Reference to the already-authorized payment, supplied by the caller.
    pub payment_intent_id: String,
    pub shipping: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen order line.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub variant_id: VariantId,
    pub product_title: String,
    pub variant_title: String,
    pub quantity: i32,
    /// Unit price at the moment the order was placed.
    pub price: Money,
    pub composites: Vec<CompositeComponent>,
}

/// Shipping address captured with an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub email: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Check the address for completeness.
    ///
    /// Returns `(field, message)` pairs for every missing or invalid field so
    /// the client can render them next to the form inputs.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<(&'static str, &'static str)> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(("name", "name is required"));
        }
        if Email::parse(&self.email).is_err() {
            errors.push(("email", "a valid email address is required"));
        }
        if self.line1.trim().is_empty() {
            errors.push(("line1", "street address is required"));
        }
        if self.city.trim().is_empty() {
            errors.push(("city", "city is required"));
        }
        if self.postal_code.trim().is_empty() {
            errors.push(("postal_code", "postal code is required"));
        }
        if self.country.trim().is_empty() {
            errors.push(("country", "country is required"));
        }

        errors
    }
}

/// Derive the human-readable order number from the creation date and a short
/// hash of the order id.
///
/// Stable for a given `(created_at, id)` pair, so re-deriving it always
/// yields the number that was persisted.
#[must_use]
pub fn order_number(created_at: DateTime<Utc>, id: OrderId) -> String {
    let digest = Sha256::digest(id.as_i32().to_be_bytes());
    let short: String = digest
        .iter()
        .take(3)
        .map(|byte| format!("{byte:02X}"))
        .collect();
    format!("TS-{}-{}", created_at.format("%Y%m%d"), short)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Keeb Fan".to_owned(),
            email: "keeb@example.com".to_owned(),
            line1: "1 Switch Street".to_owned(),
            line2: None,
            city: "Thocktown".to_owned(),
            postal_code: "12345".to_owned(),
            country: "US".to_owned(),
        }
    }

    #[test]
    fn test_complete_address_passes() {
        assert!(address().missing_fields().is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported_per_field() {
        let mut addr = address();
        addr.name = "  ".to_owned();
        addr.email = "not-an-email".to_owned();
        addr.postal_code = String::new();

        let errors = addr.missing_fields();
        let fields: Vec<&str> = errors.iter().map(|(field, _)| *field).collect();
        assert_eq!(fields, vec!["name", "email", "postal_code"]);
    }

    #[test]
    fn test_order_number_shape() {
        let created = chrono::Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        let number = order_number(created, OrderId::new(42));

        assert!(number.starts_with("TS-20260806-"));
        let suffix = number.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_order_number_is_stable_and_id_sensitive() {
        let created = chrono::Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(
            order_number(created, OrderId::new(42)),
            order_number(created, OrderId::new(42))
        );
        assert_ne!(
            order_number(created, OrderId::new(42)),
            order_number(created, OrderId::new(43))
        );
    }
}
