//! Guest contact model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_lagune_core::CustomerId;

/// A lightweight identity keyed by phone number.
///
/// Created at guest checkout and reused across orders: the normalized phone
/// is the dedup key, and name/email are updated last-write-wins on every
/// subsequent order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    /// Normalized phone (whitespace removed, `+225` prefix stripped).
    pub phone: String,
    pub created_at: DateTime<Utc>,
}
