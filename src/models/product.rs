use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Business fields of a product recommendation, as exchanged with clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_name: String,
    pub maker_name: String,
    pub price: i64,
    pub reason: String,
    pub url: String,
    pub asin: String,
}

/// Full product body as decoded from a create or full-update request
///
/// Every field is optional here so that missing fields are reported as
/// `required` violations instead of decoder failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub product_name: Option<String>,
    pub maker_name: Option<String>,
    pub price: Option<i64>,
    pub reason: Option<String>,
    pub url: Option<String>,
    pub asin: Option<String>,
}

impl From<Product> for ProductInput {
    fn from(product: Product) -> Self {
        Self {
            product_name: Some(product.product_name),
            maker_name: Some(product.maker_name),
            price: Some(product.price),
            reason: Some(product.reason),
            url: Some(product.url),
            asin: Some(product.asin),
        }
    }
}

/// Partial update body. The asin is write-once and never part of a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub maker_name: Option<String>,
    pub price: Option<i64>,
    pub reason: Option<String>,
    pub url: Option<String>,
}

impl ProductPatch {
    /// Returns true when no field is present
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.maker_name.is_none()
            && self.price.is_none()
            && self.reason.is_none()
            && self.url.is_none()
    }
}

/// A stored `products` row
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ProductRecord {
    pub id: i64,
    pub product_name: String,
    pub maker_name: String,
    pub price: i64,
    pub reason: String,
    pub url: String,
    pub asin: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `true` while active, `false` once soft-deleted
    pub status: bool,
}

impl ProductRecord {
    /// Applies the fields present in `patch`, leaving the others untouched
    pub fn apply(&mut self, patch: &ProductPatch) {
        if let Some(product_name) = &patch.product_name {
            self.product_name.clone_from(product_name);
        }
        if let Some(maker_name) = &patch.maker_name {
            self.maker_name.clone_from(maker_name);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(reason) = &patch.reason {
            self.reason.clone_from(reason);
        }
        if let Some(url) = &patch.url {
            self.url.clone_from(url);
        }
    }
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Self {
            product_name: record.product_name,
            maker_name: record.maker_name,
            price: record.price,
            reason: record.reason,
            url: record.url,
            asin: record.asin,
        }
    }
}
