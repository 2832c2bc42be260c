//! Order aggregate models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cafe_lagune_core::{
    CustomerId, NotificationPreference, OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId,
};

use super::{Customer, User};

/// Whether an order was placed by a registered account or a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIdentityKind {
    Guest,
    Connected,
}

impl OrderIdentityKind {
    /// Stable string form used for TEXT storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "GUEST",
            Self::Connected => "CONNECTED",
        }
    }

    /// Parse from the stored string form.
    #[must_use]
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "GUEST" => Some(Self::Guest),
            "CONNECTED" => Some(Self::Connected),
            _ => None,
        }
    }
}

/// Structured order metadata, persisted column-per-field.
///
/// The legacy pipe-delimited notes string is generated from these fields for
/// display only; it is never parsed back or stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMetadata {
    /// Source channel tag, e.g. `web` or a landing-page identifier.
    pub source: String,
    pub identity_kind: OrderIdentityKind,
    pub delivery_address: Option<String>,
    pub notification_preference: NotificationPreference,
    /// Free-text notes supplied by the customer.
    pub customer_notes: Option<String>,
}

impl OrderMetadata {
    /// Compose the display notes string.
    ///
    /// Pipe-joined, in a fixed order: identity marker, source tag, delivery
    /// address, non-default notification preference, free-text notes.
    #[must_use]
    pub fn display_notes(&self, account_email: Option<&str>) -> String {
        let mut parts: Vec<String> = Vec::new();

        match (self.identity_kind, account_email) {
            (OrderIdentityKind::Connected, Some(email)) => parts.push(format!("connected:{email}")),
            (OrderIdentityKind::Connected, None) => parts.push("connected".to_owned()),
            (OrderIdentityKind::Guest, _) => parts.push("guest".to_owned()),
        }

        parts.push(format!("source:{}", self.source));

        if let Some(address) = &self.delivery_address {
            parts.push(format!("livraison:{address}"));
        }

        if self.notification_preference != NotificationPreference::Email {
            parts.push(format!("notif:{}", self.notification_preference));
        }

        if let Some(notes) = &self.customer_notes {
            parts.push(notes.clone());
        }

        parts.join(" | ")
    }
}

/// An order header.
///
/// Invariant: at least one of `user_id` and `customer_id` is set, and
/// `total_price` equals the sum of `unit_price × quantity` over the items
/// persisted with it. Both are enforced at creation and never recomputed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub status: OrderStatus,
    pub total_price: Price,
    #[serde(flatten)]
    pub metadata: OrderMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchased line, immutable after creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_image_url: Option<String>,
    pub quantity: u32,
    /// Price captured at order time, immune to later catalog changes.
    pub unit_price: Price,
}

impl OrderItem {
    /// Line total: `unit_price × quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// An order joined with its items and linked identity summaries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
    pub user: Option<User>,
}

impl OrderDetails {
    /// The display notes string for this order (see
    /// [`OrderMetadata::display_notes`]).
    #[must_use]
    pub fn notes(&self) -> String {
        self.order
            .metadata
            .display_notes(self.user.as_ref().map(|u| u.email.as_str()))
    }
}
