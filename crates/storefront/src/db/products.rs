//! Catalogue repository.
//!
//! Paginated product queries. Variants and images for a page are fetched in
//! two batched queries keyed by the page's product-id set, issued
//! concurrently, instead of one query per product.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use thockshop_core::{ImageId, Money, ProductId, VariantId};

use super::RepositoryError;
use crate::models::product::{Product, ProductImage, ProductVariant, category_rank};

/// Database row shape for `products`.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    slug: String,
    title: String,
    description: String,
    category: String,
    created_at: DateTime<Utc>,
}

/// Database row shape for `product_variants`.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: VariantId,
    product_id: ProductId,
    sku: String,
    title: String,
    price: Money,
    stock_quantity: i32,
}

impl From<VariantRow> for ProductVariant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            sku: row.sku,
            title: row.title,
            price: row.price,
            stock_quantity: row.stock_quantity,
        }
    }
}

/// Database row shape for `product_images`.
#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: ImageId,
    product_id: ProductId,
    url: String,
    alt_text: Option<String>,
    position: i32,
}

impl From<ImageRow> for ProductImage {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            url: row.url,
            alt_text: row.alt_text,
            position: row.position,
        }
    }
}

/// A page of products plus the total row count for pagination.
#[derive(Debug)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Repository for catalogue reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, optionally filtered by category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn list(
        &self,
        category: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<ProductPage, RepositoryError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let (rows, total): (Vec<ProductRow>, i64) = match category {
            Some(category) => {
                let rows = sqlx::query_as(
                    "SELECT id, slug, title, description, category, created_at \
                     FROM products WHERE category = $1 \
                     ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
                )
                .bind(category)
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(self.pool)
                .await?;
                let total: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM products WHERE category = $1")
                        .bind(category)
                        .fetch_one(self.pool)
                        .await?;
                (rows, total.0)
            }
            None => {
                let rows = sqlx::query_as(
                    "SELECT id, slug, title, description, category, created_at \
                     FROM products ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
                )
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(self.pool)
                .await?;
                let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
                    .fetch_one(self.pool)
                    .await?;
                (rows, total.0)
            }
        };

        let products = self.assemble(rows).await?;

        Ok(ProductPage {
            products,
            total,
            page,
            page_size,
        })
    }

    /// A catalogue page: products grouped by category, categories ordered by
    /// the fixed priority table (keyboards first) then alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn catalogue(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<(String, Vec<Product>)>, RepositoryError> {
        let listing = self.list(None, page, page_size).await?;

        let mut groups: Vec<(String, Vec<Product>)> = Vec::new();
        for product in listing.products {
            match groups.iter_mut().find(|(cat, _)| *cat == product.category) {
                Some((_, members)) => members.push(product),
                None => groups.push((product.category.clone(), vec![product])),
            }
        }
        groups.sort_by_key(|(category, _)| category_rank(category));

        Ok(groups)
    }

    /// Fetch a single product by slug with all variants and images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Product, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, slug, title, description, category, created_at \
             FROM products WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        let mut products = self.assemble(vec![row]).await?;
        products.pop().ok_or(RepositoryError::NotFound)
    }

    /// Attach variants and images to a set of product rows.
    ///
    /// Two batched queries over the page's product-id set, issued
    /// concurrently and joined before assembly.
    async fn assemble(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|row| row.id.as_i32()).collect();

        let variants_query = sqlx::query_as::<_, VariantRow>(
            "SELECT id, product_id, sku, title, price, stock_quantity \
             FROM product_variants WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(self.pool);
        let images_query = sqlx::query_as::<_, ImageRow>(
            "SELECT id, product_id, url, alt_text, position \
             FROM product_images WHERE product_id = ANY($1) ORDER BY position, id",
        )
        .bind(&ids)
        .fetch_all(self.pool);

        let (variant_rows, image_rows) = tokio::try_join!(variants_query, images_query)?;

        let mut variants_by_product: HashMap<ProductId, Vec<ProductVariant>> = HashMap::new();
        for row in variant_rows {
            variants_by_product
                .entry(row.product_id)
                .or_default()
                .push(row.into());
        }

        let mut images_by_product: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for row in image_rows {
            images_by_product
                .entry(row.product_id)
                .or_default()
                .push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Product {
                variants: variants_by_product.remove(&row.id).unwrap_or_default(),
                images: images_by_product.remove(&row.id).unwrap_or_default(),
                id: row.id,
                slug: row.slug,
                title: row.title,
                description: row.description,
                category: row.category,
                created_at: row.created_at,
            })
            .collect())
    }
}
