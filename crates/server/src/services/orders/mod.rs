//! The order-creation workflow.
//!
//! Control flow: resolve who is ordering, validate and price the cart
//! against the catalog (no writes), then run a single transaction that
//! upserts the guest contact, materializes ad-hoc products, and persists
//! the order header with all its lines. Notifications go out after commit
//! on a detached task.

pub mod cart;
pub mod identity;

use sqlx::SqlitePool;
use thiserror::Error;

use cafe_lagune_core::NotificationPreference;

use crate::db::{
    CustomerRepository, NewOrder, NewOrderLine, OrderRepository, ProductRepository,
    RepositoryError,
};
use crate::models::order::{OrderIdentityKind, OrderMetadata};
use crate::models::OrderDetails;

use super::notify::{NotificationChannel, NotificationDispatcher};

pub use cart::RequestedItem;
pub use identity::OrderIdentity;

/// Default source channel when the client doesn't send one.
const DEFAULT_SOURCE: &str = "web";

/// Errors from the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Client-caused validation failure; the message is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    /// Every requested item was unavailable.
    #[error("Aucun produit disponible dans la commande")]
    NoAvailableProducts {
        /// Names of the unavailable products, for the error response.
        unavailable: Vec<String>,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Raw order-creation input, after JSON decoding but before validation.
#[derive(Debug, Clone, Default)]
pub struct CreateOrderInput {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<RequestedItem>,
    pub notes: Option<String>,
    pub source: Option<String>,
    pub notification_preference: NotificationPreference,
}

/// A successfully created order plus response metadata.
#[derive(Debug)]
pub struct CreatedOrder {
    pub details: OrderDetails,
    /// Notification channels handed to the dispatcher.
    pub channels: Vec<NotificationChannel>,
    /// Requested products dropped because they were unavailable.
    pub unavailable: Vec<String>,
}

/// Orchestrates order creation end to end.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    dispatcher: &'a NotificationDispatcher,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, dispatcher: &'a NotificationDispatcher) -> Self {
        Self { pool, dispatcher }
    }

    /// Create an order for a guest or an authenticated user.
    ///
    /// The persistence step is atomic: either the guest contact, any ad-hoc
    /// products, the order header, and all its lines are committed together,
    /// or none of them are.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` / `OrderError::NoAvailableProducts`
    /// for client-caused failures and `OrderError::Repository` when the
    /// transaction cannot be committed.
    pub async fn create(
        &self,
        session_user: Option<&crate::models::CurrentUser>,
        input: CreateOrderInput,
    ) -> Result<CreatedOrder, OrderError> {
        let identity = identity::resolve(
            session_user,
            input.customer_name.as_deref(),
            input.customer_phone.as_deref(),
            input.customer_email.as_deref(),
        )?;

        let cart = cart::validate(&ProductRepository::new(self.pool), &input.items).await?;

        let metadata = OrderMetadata {
            source: input
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_owned()),
            identity_kind: match identity {
                OrderIdentity::Account { .. } => OrderIdentityKind::Connected,
                OrderIdentity::Guest { .. } => OrderIdentityKind::Guest,
            },
            delivery_address: input.customer_address.filter(|a| !a.trim().is_empty()),
            notification_preference: input.notification_preference,
            customer_notes: input.notes.filter(|n| !n.trim().is_empty()),
        };

        // Write phase: one transaction for everything the order needs.
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let customer_id = match identity.contact() {
            Some(contact) => Some(
                CustomerRepository::upsert_by_phone(
                    &mut *tx,
                    &contact.name,
                    contact.email.as_ref().map(cafe_lagune_core::Email::as_str),
                    &contact.phone,
                )
                .await?
                .id,
            ),
            None => None,
        };

        let mut lines = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            match line {
                cart::ValidatedLine::Catalog {
                    product_id,
                    quantity,
                    unit_price,
                } => lines.push(NewOrderLine {
                    product_id: *product_id,
                    quantity: *quantity,
                    unit_price: *unit_price,
                }),
                cart::ValidatedLine::AdHoc { draft, quantity } => {
                    let product_id = ProductRepository::create_ad_hoc(&mut *tx, draft).await?;
                    lines.push(NewOrderLine {
                        product_id,
                        quantity: *quantity,
                        unit_price: draft.price,
                    });
                }
            }
        }

        let order_id = OrderRepository::insert(
            &mut *tx,
            &NewOrder {
                user_id: identity.user_id(),
                customer_id,
                total_price: cart.total,
                metadata,
            },
            &lines,
        )
        .await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        let details = OrderRepository::new(self.pool)
            .get_details(order_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {order_id} vanished after commit"
                ))
            })?;

        tracing::info!(
            order_id = %details.order.id,
            total = %details.order.total_price,
            items = details.items.len(),
            "Order created"
        );

        // Post-commit, detached: the order is already a success.
        let channels = self.dispatcher.dispatch(&details);

        Ok(CreatedOrder {
            details,
            channels,
            unavailable: cart.unavailable,
        })
    }
}
