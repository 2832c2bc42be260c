//! Order repository: atomic creation and aggregate reads.
//!
//! The insert path runs inside a caller-owned transaction so the order
//! header, its items, and any supporting rows (guest contact, ad-hoc
//! products) commit or roll back as one unit. No partial order is ever
//! visible to a reader.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use cafe_lagune_core::{
    CustomerId, OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId, UserRole,
};

use super::RepositoryError;
use crate::models::order::{Order, OrderDetails, OrderIdentityKind, OrderItem, OrderMetadata};
use crate::models::{Customer, User};

/// A fully resolved order header, ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_id: Option<CustomerId>,
    pub total_price: Price,
    pub metadata: OrderMetadata,
}

/// A resolved line ready to insert: the product row already exists.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    customer_id: Option<i64>,
    status: String,
    total_price: i64,
    source: String,
    identity_kind: String,
    delivery_address: Option<String>,
    notification_preference: String,
    customer_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    product_name: String,
    product_image_url: Option<String>,
    quantity: i64,
    unit_price: i64,
}

fn map_order(row: OrderRow) -> Result<Order, RepositoryError> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid status in database: {e}")))?;

    let identity_kind = OrderIdentityKind::from_db(&row.identity_kind).ok_or_else(|| {
        RepositoryError::DataCorruption(format!(
            "invalid identity kind in database: {}",
            row.identity_kind
        ))
    })?;

    let notification_preference = row.notification_preference.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid notification preference: {e}"))
    })?;

    Ok(Order {
        id: OrderId::new(row.id),
        user_id: row.user_id.map(UserId::new),
        customer_id: row.customer_id.map(CustomerId::new),
        status,
        total_price: Price::new(row.total_price),
        metadata: OrderMetadata {
            source: row.source,
            identity_kind,
            delivery_address: row.delivery_address,
            notification_preference,
            customer_notes: row.customer_notes,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn map_item(row: OrderItemRow) -> Result<OrderItem, RepositoryError> {
    let quantity = u32::try_from(row.quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("invalid quantity in database: {}", row.quantity))
    })?;

    Ok(OrderItem {
        id: OrderItemId::new(row.id),
        order_id: OrderId::new(row.order_id),
        product_id: ProductId::new(row.product_id),
        product_name: row.product_name,
        product_image_url: row.product_image_url,
        quantity,
        unit_price: Price::new(row.unit_price),
    })
}

const SELECT_ORDER: &str = "SELECT id, user_id, customer_id, status, total_price, source, \
                            identity_kind, delivery_address, notification_preference, \
                            customer_notes, created_at, updated_at FROM orders";

const SELECT_ITEMS: &str = "SELECT oi.id, oi.order_id, oi.product_id, \
                            p.name AS product_name, p.image_url AS product_image_url, \
                            oi.quantity, oi.unit_price \
                            FROM order_items oi JOIN products p ON p.id = oi.product_id \
                            WHERE oi.order_id = ? ORDER BY oi.id ASC";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the order header and all its lines inside an open transaction.
    ///
    /// The caller owns the transaction; nothing becomes visible until it
    /// commits, and any failure here rolls everything back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if neither a user nor a
    /// customer is attached (unreachable through the order service, which
    /// builds orders from a resolved identity).
    /// Returns `RepositoryError::Conflict` on a unique violation during the
    /// insert (the duplicate-order heuristic).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        conn: &mut SqliteConnection,
        new: &NewOrder,
        lines: &[NewOrderLine],
    ) -> Result<OrderId, RepositoryError> {
        if new.user_id.is_none() && new.customer_id.is_none() {
            return Err(RepositoryError::DataCorruption(
                "order has neither user nor customer".to_owned(),
            ));
        }

        let (order_id,): (i64,) = sqlx::query_as(
            "INSERT INTO orders (user_id, customer_id, status, total_price, source, \
                                 identity_kind, delivery_address, notification_preference, \
                                 customer_notes) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(new.user_id.map(|id| id.as_i64()))
        .bind(new.customer_id.map(|id| id.as_i64()))
        .bind(OrderStatus::Pending.as_str())
        .bind(new.total_price.amount())
        .bind(&new.metadata.source)
        .bind(new.metadata.identity_kind.as_str())
        .bind(&new.metadata.delivery_address)
        .bind(new.metadata.notification_preference.as_str())
        .bind(&new.metadata.customer_notes)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("duplicate order".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id.as_i64())
            .bind(i64::from(line.quantity))
            .bind(line.unit_price.amount())
            .execute(&mut *conn)
            .await?;
        }

        Ok(OrderId::new(order_id))
    }

    /// Fetch an order with items and linked identity summaries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn get_details(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(self.load_details(map_order(r)?).await?)),
            None => Ok(None),
        }
    }

    /// List orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        let rows = match status {
            Some(s) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDER} WHERE status = ? ORDER BY created_at DESC, id DESC"
                ))
                .bind(s.as_str())
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{SELECT_ORDER} ORDER BY created_at DESC, id DESC"
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            details.push(self.load_details(map_order(row)?).await?);
        }
        Ok(details)
    }

    /// Update the status and/or customer notes of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        notes: Option<&str>,
    ) -> Result<OrderDetails, RepositoryError> {
        let result = sqlx::query(
            "UPDATE orders SET \
                 status = COALESCE(?, status), \
                 customer_notes = COALESCE(?, customer_notes), \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
             WHERE id = ?",
        )
        .bind(status.map(|s| s.as_str()))
        .bind(notes)
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_details(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Find orders whose linked contact's phone contains the given digit
    /// fragment, newest first. Used for self-service tracking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored enums are invalid.
    pub async fn find_by_phone_fragment(
        &self,
        fragment: &str,
    ) -> Result<Vec<OrderDetails>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT o.id, o.user_id, o.customer_id, o.status, o.total_price, o.source, \
                    o.identity_kind, o.delivery_address, o.notification_preference, \
                    o.customer_notes, o.created_at, o.updated_at \
             FROM orders o \
             JOIN customers c ON c.id = o.customer_id \
             WHERE instr(c.phone, ?) > 0 \
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(fragment)
        .fetch_all(self.pool)
        .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            details.push(self.load_details(map_order(row)?).await?);
        }
        Ok(details)
    }

    /// Attach items and identity summaries to a mapped order header.
    async fn load_details(&self, order: Order) -> Result<OrderDetails, RepositoryError> {
        let item_rows = sqlx::query_as::<_, OrderItemRow>(SELECT_ITEMS)
            .bind(order.id.as_i64())
            .fetch_all(self.pool)
            .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in item_rows {
            items.push(map_item(row)?);
        }

        let customer = match order.customer_id {
            Some(id) => self.fetch_customer(id).await?,
            None => None,
        };

        let user = match order.user_id {
            Some(id) => self.fetch_user(id).await?,
            None => None,
        };

        Ok(OrderDetails {
            order,
            items,
            customer,
            user,
        })
    }

    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: i64,
            name: String,
            email: Option<String>,
            phone: String,
            created_at: DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT id, name, email, phone, created_at FROM customers WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Customer {
            id: CustomerId::new(r.id),
            name: r.name,
            email: r.email,
            phone: r.phone,
            created_at: r.created_at,
        }))
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: i64,
            name: String,
            email: String,
            role: String,
            created_at: DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => {
                let role: UserRole = r.role.parse().map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
                })?;
                Ok(Some(User {
                    id: UserId::new(r.id),
                    name: r.name,
                    email: r.email,
                    role,
                    created_at: r.created_at,
                }))
            }
            None => Ok(None),
        }
    }
}
