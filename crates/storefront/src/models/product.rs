//! Catalogue domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use thockshop_core::{ImageId, Money, ProductId, StockStatus, VariantId};

/// A catalogue product with its variants and images.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Free-form category name ("keyboards", "switches", "keycaps", ...).
    pub category: String,
    pub variants: Vec<ProductVariant>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub title: String,
    pub price: Money,
    pub stock_quantity: i32,
}

impl ProductVariant {
    /// Stock status derived from the on-hand quantity at read time.
    #[must_use]
    pub const fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(self.stock_quantity)
    }
}

/// A product image.
#[derive(Debug, Clone, Serialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub url: String,
    pub alt_text: Option<String>,
    pub position: i32,
}

/// Sort key for catalogue category grouping: the fixed priority table first
/// (keyboards lead), everything else alphabetically after it.
#[must_use]
pub fn category_rank(category: &str) -> (u8, String) {
    let priority = match category {
        "keyboards" => 0,
        "switches" => 1,
        "keycaps" => 2,
        _ => 3,
    };
    (priority, category.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_stock_status_is_derived() {
        let mut variant = ProductVariant {
            id: VariantId::new(1),
            product_id: ProductId::new(1),
            sku: "KB-T75-BLK".to_owned(),
            title: "Black".to_owned(),
            price: Money::from_cents(12900),
            stock_quantity: 0,
        };
        assert_eq!(variant.stock_status(), StockStatus::OutOfStock);

        variant.stock_quantity = 3;
        assert_eq!(variant.stock_status(), StockStatus::LowStock);

        variant.stock_quantity = 40;
        assert_eq!(variant.stock_status(), StockStatus::InStock);
    }

    #[test]
    fn test_category_rank_orders_keyboards_first() {
        let mut categories = vec!["deskmats", "keycaps", "switches", "cables", "keyboards"];
        categories.sort_by_key(|c| category_rank(c));
        assert_eq!(
            categories,
            vec!["keyboards", "switches", "keycaps", "cables", "deskmats"]
        );
    }
}
