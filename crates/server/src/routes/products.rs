//! Catalog route handlers: a public read surface and an admin CRUD surface.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use cafe_lagune_core::{Price, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::{NewProduct, Product};
use crate::state::AppState;

/// GET /api/products
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_available().await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|p| p.available)
        .ok_or_else(|| AppError::NotFound(format!("produit {id}")))?;
    Ok(Json(product))
}

/// GET /api/admin/products
pub async fn admin_list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products))
}

/// Product creation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Price,
    pub category: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub stock: i64,
}

const fn default_available() -> bool {
    true
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Le nom du produit est requis".to_owned()));
    }
    if req.price.is_negative() {
        return Err(AppError::Validation(format!(
            "Prix invalide : {}",
            req.price.amount()
        )));
    }

    let product = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name: name.to_owned(),
            description: req.description,
            image_url: req.image,
            price: req.price,
            category: req.category,
            available: req.available,
            stock: req.stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Product update request body. Absent fields are left untouched.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub available: Option<bool>,
    pub stock: Option<i64>,
}

/// PATCH /api/admin/products/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if let Some(price) = req.price {
        if price.is_negative() {
            return Err(AppError::Validation(format!(
                "Prix invalide : {}",
                price.amount()
            )));
        }
    }

    let product = ProductRepository::new(state.pool())
        .update(
            ProductId::new(id),
            req.name.as_deref(),
            req.description.as_deref(),
            req.image.as_deref(),
            req.price,
            req.category.as_deref(),
            req.available,
            req.stock,
        )
        .await?;

    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
///
/// Products referenced by past orders can't be removed outright, so
/// deletion means hiding them from the catalog.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .set_unavailable(ProductId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
