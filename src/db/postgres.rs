use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, query, query_as, PgPool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Product, ProductPatch, ProductRecord},
};

use super::ProductRepository;

const FIND_PRODUCT_SQL: &str = include_str!("sql/find_product.sql");
const INSERT_PRODUCT_SQL: &str = include_str!("sql/insert_product.sql");
const REPLACE_PRODUCT_SQL: &str = include_str!("sql/replace_product.sql");
const PATCH_PRODUCT_SQL: &str = include_str!("sql/patch_product.sql");
const SET_PRODUCT_STATUS_SQL: &str = include_str!("sql/set_product_status.sql");

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Product rows stored in the `products` table
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find(&self, asin: &str, active: bool) -> AppResult<Option<ProductRecord>> {
        let record = query_as::<Postgres, ProductRecord>(FIND_PRODUCT_SQL)
            .bind(asin)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn insert(&self, product: &Product) -> AppResult<ProductRecord> {
        query_as::<Postgres, ProductRecord>(INSERT_PRODUCT_SQL)
            .bind(&product.product_name)
            .bind(&product.maker_name)
            .bind(product.price)
            .bind(&product.reason)
            .bind(&product.url)
            .bind(&product.asin)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, &product.asin))
    }

    async fn replace(&self, asin: &str, product: &Product) -> AppResult<Option<ProductRecord>> {
        let record = query_as::<Postgres, ProductRecord>(REPLACE_PRODUCT_SQL)
            .bind(asin)
            .bind(&product.product_name)
            .bind(&product.maker_name)
            .bind(product.price)
            .bind(&product.reason)
            .bind(&product.url)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn patch(&self, asin: &str, patch: &ProductPatch) -> AppResult<Option<ProductRecord>> {
        let record = query_as::<Postgres, ProductRecord>(PATCH_PRODUCT_SQL)
            .bind(asin)
            .bind(patch.product_name.as_deref())
            .bind(patch.maker_name.as_deref())
            .bind(patch.price)
            .bind(patch.reason.as_deref())
            .bind(patch.url.as_deref())
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn set_status(&self, record: &ProductRecord, active: bool) -> AppResult<bool> {
        let result = query(SET_PRODUCT_STATUS_SQL)
            .bind(record.id)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_write(e, &record.asin))?;

        Ok(result.rows_affected() == 1)
    }
}
