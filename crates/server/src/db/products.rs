//! Product repository for catalog database operations.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use cafe_lagune_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::product::{NewProduct, Product};

/// Raw row shape, mapped to [`Product`] after fetching.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    price: i64,
    category: Option<String>,
    available: bool,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            price: Price::new(row.price),
            category: row.category,
            available: row.available,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, image_url, price, category, \
                              available, stock, created_at, updated_at FROM products";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// List products visible in the public catalog (`available = true`).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_available(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{SELECT_COLUMNS} WHERE available = 1 ORDER BY name ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// List every product, including unavailable and ad-hoc ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a new catalog product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (name, description, image_url, price, category, available, stock) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING id, name, description, image_url, price, category, available, stock, \
                       created_at, updated_at",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.price.amount())
        .bind(&new.category)
        .bind(new.available)
        .bind(new.stock)
        .fetch_one(self.pool)
        .await?;

        Ok(Product::from(row))
    }

    /// Insert an ad-hoc product inside an open order transaction.
    ///
    /// The row is created with `available = false` so it never appears in
    /// public listings; it exists only as the backing record for order lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_ad_hoc(
        conn: &mut SqliteConnection,
        new: &NewProduct,
    ) -> Result<ProductId, RepositoryError> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO products (name, description, image_url, price, category, available, stock) \
             VALUES (?, ?, ?, ?, ?, 0, 0) \
             RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.price.amount())
        .bind(&new.category)
        .fetch_one(conn)
        .await?;

        Ok(ProductId::new(id))
    }

    /// Partially update a product. `None` fields keep their current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: ProductId,
        name: Option<&str>,
        description: Option<&str>,
        image_url: Option<&str>,
        price: Option<Price>,
        category: Option<&str>,
        available: Option<bool>,
        stock: Option<i64>,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "UPDATE products SET \
                 name = COALESCE(?, name), \
                 description = COALESCE(?, description), \
                 image_url = COALESCE(?, image_url), \
                 price = COALESCE(?, price), \
                 category = COALESCE(?, category), \
                 available = COALESCE(?, available), \
                 stock = COALESCE(?, stock), \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
             WHERE id = ? \
             RETURNING id, name, description, image_url, price, category, available, stock, \
                       created_at, updated_at",
        )
        .bind(name)
        .bind(description)
        .bind(image_url)
        .bind(price.map(|p| p.amount()))
        .bind(category)
        .bind(available)
        .bind(stock)
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::from).ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a product by flipping `available` to false.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_unavailable(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET available = 0, \
             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
        )
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
