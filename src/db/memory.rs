use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{Product, ProductPatch, ProductRecord},
};

use super::ProductRepository;

/// Product rows held in process memory
///
/// Enforces the same one-active-row-per-asin rule as the `products` schema.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<ProductRecord>,
    next_id: i64,
}

impl Inner {
    fn active_mut(&mut self, asin: &str) -> Option<&mut ProductRecord> {
        self.rows.iter_mut().find(|row| row.status && row.asin == asin)
    }
}

impl InMemoryProductRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find(&self, asin: &str, active: bool) -> AppResult<Option<ProductRecord>> {
        let inner = self.inner.read().await;
        let record = inner
            .rows
            .iter()
            .filter(|row| row.asin == asin && row.status == active)
            .max_by_key(|row| (row.updated_at, row.id))
            .cloned();

        Ok(record)
    }

    async fn insert(&self, product: &Product) -> AppResult<ProductRecord> {
        let mut inner = self.inner.write().await;
        if inner.active_mut(&product.asin).is_some() {
            return Err(AppError::Conflict(product.asin.clone()));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let record = ProductRecord {
            id: inner.next_id,
            product_name: product.product_name.clone(),
            maker_name: product.maker_name.clone(),
            price: product.price,
            reason: product.reason.clone(),
            url: product.url.clone(),
            asin: product.asin.clone(),
            created_at: now,
            updated_at: now,
            status: true,
        };
        inner.rows.push(record.clone());

        Ok(record)
    }

    async fn replace(&self, asin: &str, product: &Product) -> AppResult<Option<ProductRecord>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.active_mut(asin) else {
            return Ok(None);
        };

        row.product_name.clone_from(&product.product_name);
        row.maker_name.clone_from(&product.maker_name);
        row.price = product.price;
        row.reason.clone_from(&product.reason);
        row.url.clone_from(&product.url);
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn patch(&self, asin: &str, patch: &ProductPatch) -> AppResult<Option<ProductRecord>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.active_mut(asin) else {
            return Ok(None);
        };

        row.apply(patch);
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn set_status(&self, record: &ProductRecord, active: bool) -> AppResult<bool> {
        let mut inner = self.inner.write().await;

        let other_active = inner
            .rows
            .iter()
            .any(|row| row.status && row.asin == record.asin && row.id != record.id);
        if active && other_active {
            return Err(AppError::Conflict(record.asin.clone()));
        }

        match inner
            .rows
            .iter_mut()
            .find(|row| row.id == record.id && row.status != active)
        {
            Some(row) => {
                row.status = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
