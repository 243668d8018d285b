//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use self::migrate::MigrationError;

/// Connect to the storefront database using the usual environment variables.
pub(crate) async fn connect() -> Result<PgPool, MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("THOCKSHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("THOCKSHOP_DATABASE_URL"))?;

    let pool = thockshop_storefront::db::create_pool(&database_url).await?;
    Ok(pool)
}
