//! Catalogue route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use thockshop_core::{Money, ProductId, StockStatus, VariantId};

use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::models::product::{Product, ProductImage, ProductVariant};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 24;

/// Query parameters for product listings.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query parameters for the catalogue page.
#[derive(Debug, Deserialize)]
pub struct CatalogueQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// A product as returned to clients.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub variants: Vec<VariantView>,
    pub images: Vec<ImageView>,
}

/// A variant as returned to clients. Stock is exposed as the derived status,
/// never as the raw quantity.
#[derive(Debug, Serialize)]
pub struct VariantView {
    pub id: VariantId,
    pub sku: String,
    pub title: String,
    pub price: Money,
    pub stock_status: StockStatus,
}

/// An image as returned to clients.
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A paginated product listing.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductView>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// One category group on the catalogue page.
#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub products: Vec<ProductView>,
}

impl From<&ProductVariant> for VariantView {
    fn from(variant: &ProductVariant) -> Self {
        Self {
            id: variant.id,
            sku: variant.sku.clone(),
            title: variant.title.clone(),
            price: variant.price,
            stock_status: variant.stock_status(),
        }
    }
}

impl From<&ProductImage> for ImageView {
    fn from(image: &ProductImage) -> Self {
        Self {
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
        }
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            variants: product.variants.iter().map(VariantView::from).collect(),
            images: product.images.iter().map(ImageView::from).collect(),
        }
    }
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>> {
    let page = ProductRepository::new(state.pool())
        .list(
            query.category.as_deref(),
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(ProductListResponse {
        products: page.products.iter().map(ProductView::from).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// `GET /catalogue`
#[instrument(skip(state))]
pub async fn catalogue(
    State(state): State<AppState>,
    Query(query): Query<CatalogueQuery>,
) -> Result<Json<Vec<CategoryGroup>>> {
    let groups = ProductRepository::new(state.pool())
        .catalogue(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(Json(
        groups
            .into_iter()
            .map(|(category, products)| CategoryGroup {
                category,
                products: products.iter().map(ProductView::from).collect(),
            })
            .collect(),
    ))
}

/// `GET /products/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?;

    Ok(Json(ProductView::from(&product)))
}
