//! Line-item validation and pricing.
//!
//! Validation is pure: it reads the catalog but writes nothing. Ad-hoc
//! items come out as drafts that the order transaction materializes, so a
//! failed request leaves no stray catalog rows behind.

use cafe_lagune_core::{Price, ProductId};

use crate::db::ProductRepository;
use crate::models::product::NewProduct;

use super::OrderError;

/// One raw requested item, straight from the client.
#[derive(Debug, Clone)]
pub enum RequestedItem {
    /// Reference to an existing catalog product.
    Catalog { product_id: ProductId, quantity: i64 },
    /// Inline product sold by a standalone landing page.
    AdHoc {
        name: String,
        price: Price,
        quantity: i64,
        description: Option<String>,
        image_url: Option<String>,
        category: Option<String>,
    },
}

impl RequestedItem {
    const fn quantity(&self) -> i64 {
        match self {
            Self::Catalog { quantity, .. } | Self::AdHoc { quantity, .. } => *quantity,
        }
    }
}

/// A validated line, priced and ready for the write phase.
#[derive(Debug, Clone)]
pub enum ValidatedLine {
    /// Existing product; unit price captured at validation time.
    Catalog {
        product_id: ProductId,
        quantity: u32,
        unit_price: Price,
    },
    /// Ad-hoc draft; the backing catalog row is created inside the order
    /// transaction with `available = false`.
    AdHoc { draft: NewProduct, quantity: u32 },
}

impl ValidatedLine {
    /// `unit_price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        match self {
            Self::Catalog {
                quantity,
                unit_price,
                ..
            } => unit_price.times(*quantity),
            Self::AdHoc { draft, quantity } => draft.price.times(*quantity),
        }
    }
}

/// The outcome of cart validation.
#[derive(Debug, Clone)]
pub struct ValidatedCart {
    pub lines: Vec<ValidatedLine>,
    pub total: Price,
    /// Names of requested catalog products that were skipped because they
    /// are unavailable. Not a failure unless nothing else remains.
    pub unavailable: Vec<String>,
}

/// Validate and price the requested items, in input order.
///
/// # Errors
///
/// Returns `OrderError::Validation` for an empty cart, a non-positive
/// quantity, an unknown catalog id, or a negative ad-hoc price.
/// Returns `OrderError::NoAvailableProducts` when every requested item was
/// unavailable.
pub async fn validate(
    products: &ProductRepository<'_>,
    items: &[RequestedItem],
) -> Result<ValidatedCart, OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("Le panier est vide".to_owned()));
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut total = Price::ZERO;
    let mut unavailable = Vec::new();

    for item in items {
        let quantity = item.quantity();
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| {
                OrderError::Validation(format!("Quantité invalide : {quantity}"))
            })?;

        match item {
            RequestedItem::Catalog { product_id, .. } => {
                let product = products.get(*product_id).await?.ok_or_else(|| {
                    OrderError::Validation(format!("Produit introuvable : {product_id}"))
                })?;

                if !product.available {
                    unavailable.push(product.name);
                    continue;
                }

                total = total.plus(product.price.times(quantity));
                lines.push(ValidatedLine::Catalog {
                    product_id: product.id,
                    quantity,
                    unit_price: product.price,
                });
            }
            RequestedItem::AdHoc {
                name,
                price,
                description,
                image_url,
                category,
                ..
            } => {
                if price.is_negative() {
                    return Err(OrderError::Validation(format!(
                        "Prix invalide pour {name} : {price}"
                    )));
                }

                total = total.plus(price.times(quantity));
                lines.push(ValidatedLine::AdHoc {
                    draft: NewProduct {
                        name: name.clone(),
                        description: description.clone(),
                        image_url: image_url.clone(),
                        price: *price,
                        category: category.clone(),
                        available: false,
                        stock: 0,
                    },
                    quantity,
                });
            }
        }
    }

    if lines.is_empty() {
        return Err(OrderError::NoAvailableProducts { unavailable });
    }

    Ok(ValidatedCart {
        lines,
        total,
        unavailable,
    })
}
