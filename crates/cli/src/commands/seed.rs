//! Seed the catalogue with demo products and discount codes.
//!
//! Idempotent: products are keyed by slug, variants by sku and discounts by
//! code, so re-running updates nothing and duplicates nothing.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use super::migrate::MigrationError;

struct SeedVariant {
    sku: &'static str,
    title: &'static str,
    /// Price in cents.
    price_cents: i64,
    stock: i32,
}

struct SeedProduct {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    category: &'static str,
    image: &'static str,
    variants: &'static [SeedVariant],
}

const CATALOGUE: &[SeedProduct] = &[
    SeedProduct {
        slug: "tactile75",
        title: "Tactile75 Mechanical Keyboard",
        description: "Gasket-mounted 75% aluminium board with a flex-cut PC plate. \
                      Hotswap sockets, south-facing LEDs, ships with a coiled cable.",
        category: "keyboards",
        image: "/static/images/products/tactile75.jpg",
        variants: &[
            SeedVariant {
                sku: "KB-T75-BLK",
                title: "Matte Black",
                price_cents: 12_900,
                stock: 25,
            },
            SeedVariant {
                sku: "KB-T75-WHT",
                title: "Arctic White",
                price_cents: 12_900,
                stock: 3,
            },
        ],
    },
    SeedProduct {
        slug: "ruby-linear-switches",
        title: "Ruby Linear Switches",
        description: "Factory-lubed 62g linears with a long-pole stem. Deep, \
                      marbly bottom-out; our go-to recommendation for a first build.",
        category: "switches",
        image: "/static/images/products/ruby-linear.jpg",
        variants: &[SeedVariant {
            sku: "SW-RUBY-70",
            title: "70 pack",
            price_cents: 3_500,
            stock: 120,
        }],
    },
    SeedProduct {
        slug: "cream-tactile-switches",
        title: "Cream Tactile Switches",
        description: "Medium-strength tactile bump with a rounded top-out. \
                      Restock lands monthly and sells through fast.",
        category: "switches",
        image: "/static/images/products/cream-tactile.jpg",
        variants: &[SeedVariant {
            sku: "SW-CREAM-70",
            title: "70 pack",
            price_cents: 3_200,
            stock: 0,
        }],
    },
    SeedProduct {
        slug: "mt3-sepia-keycaps",
        title: "MT3 Sepia Keycaps",
        description: "High-profile sculpted ABS set in warm sepia tones. Base kit \
                      covers ANSI 60-100% layouts.",
        category: "keycaps",
        image: "/static/images/products/mt3-sepia.jpg",
        variants: &[SeedVariant {
            sku: "KC-MT3-SEPIA",
            title: "Base kit",
            price_cents: 9_900,
            stock: 40,
        }],
    },
];

/// Seed the catalogue and discounts.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or an insert
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    for product in CATALOGUE {
        seed_product(&pool, product).await?;
    }
    seed_discounts(&pool).await?;

    info!("Seed complete!");
    Ok(())
}

async fn seed_product(pool: &PgPool, product: &SeedProduct) -> Result<(), MigrationError> {
    let product_id: Option<(i32,)> = sqlx::query_as(
        "INSERT INTO products (slug, title, description, category) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (slug) DO NOTHING \
         RETURNING id",
    )
    .bind(product.slug)
    .bind(product.title)
    .bind(product.description)
    .bind(product.category)
    .fetch_optional(pool)
    .await?;

    let Some((product_id,)) = product_id else {
        info!(slug = product.slug, "product already seeded, skipping");
        return Ok(());
    };

    for variant in product.variants {
        sqlx::query(
            "INSERT INTO product_variants (product_id, sku, title, price, stock_quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (sku) DO NOTHING",
        )
        .bind(product_id)
        .bind(variant.sku)
        .bind(variant.title)
        .bind(Decimal::new(variant.price_cents, 2))
        .bind(variant.stock)
        .execute(pool)
        .await?;
    }

    sqlx::query("INSERT INTO product_images (product_id, url, alt_text, position) VALUES ($1, $2, $3, 0)")
        .bind(product_id)
        .bind(product.image)
        .bind(product.title)
        .execute(pool)
        .await?;

    info!(slug = product.slug, "seeded product");
    Ok(())
}

async fn seed_discounts(pool: &PgPool) -> Result<(), MigrationError> {
    sqlx::query(
        "INSERT INTO discounts (code, description, amount, min_subtotal, active) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT (code) DO NOTHING",
    )
    .bind("WELCOME10")
    .bind("$10 off your first order over $50")
    .bind(Decimal::new(10_00, 2))
    .bind(Decimal::new(50_00, 2))
    .execute(pool)
    .await?;

    info!("seeded discounts");
    Ok(())
}
