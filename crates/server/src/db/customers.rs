//! Guest contact repository.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use cafe_lagune_core::{CustomerId, Phone};

use super::RepositoryError;
use crate::models::Customer;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    email: Option<String>,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

/// Repository for guest contact database operations.
pub struct CustomerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a customer by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone, created_at FROM customers WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Look up a customer by their normalized phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_phone(&self, phone: &Phone) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, email, phone, created_at FROM customers WHERE phone = ?",
        )
        .bind(phone.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Create or update a guest contact by normalized phone, inside an open
    /// order transaction.
    ///
    /// A single conditional upsert on the unique phone column, so two
    /// concurrent first-time orders with the same number converge on one
    /// row. Name is last-write-wins; a previously known email is kept when
    /// the new order supplies none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_by_phone(
        conn: &mut SqliteConnection,
        name: &str,
        email: Option<&str>,
        phone: &Phone,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "INSERT INTO customers (name, email, phone) VALUES (?, ?, ?) \
             ON CONFLICT (phone) DO UPDATE SET \
                 name = excluded.name, \
                 email = COALESCE(excluded.email, customers.email) \
             RETURNING id, name, email, phone, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(phone.as_str())
        .fetch_one(conn)
        .await?;

        Ok(Customer::from(row))
    }
}
