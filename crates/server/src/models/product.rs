//! Catalog product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_lagune_core::{Price, ProductId};

/// A purchasable catalog item.
///
/// Rows are never deleted: admin "removal" and ad-hoc landing-page products
/// both set `available = false`, keeping the row as the permanent backing
/// record for past order lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Unit price in CFA francs.
    pub price: Price,
    pub category: Option<String>,
    pub available: bool,
    /// Tracked for the admin console; the order workflow never decrements it.
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating or replacing a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Price,
    pub category: Option<String>,
    pub available: bool,
    pub stock: i64,
}
