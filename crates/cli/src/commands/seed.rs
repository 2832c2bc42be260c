//! Seed the catalog with the house coffees.

use cafe_lagune_core::Price;
use cafe_lagune_server::db::ProductRepository;
use cafe_lagune_server::models::NewProduct;
use thiserror::Error;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] cafe_lagune_server::db::RepositoryError),
}

/// The starting menu. Prices in CFA francs.
fn house_coffees() -> Vec<NewProduct> {
    let item = |name: &str, description: &str, price: i64, category: &str| NewProduct {
        name: name.to_owned(),
        description: Some(description.to_owned()),
        image_url: None,
        price: Price::new(price),
        category: Some(category.to_owned()),
        available: true,
        stock: 50,
    };

    vec![
        item(
            "Moka d'Abidjan",
            "Espresso double, chocolat noir, lait vapeur",
            2000,
            "café",
        ),
        item(
            "Robusta de Man",
            "Café filtre corsé des montagnes de Man",
            1500,
            "café",
        ),
        item(
            "Espresso Lagune",
            "Notre assemblage maison, torréfaction foncée",
            1200,
            "café",
        ),
        item(
            "Cappuccino Cocody",
            "Espresso, mousse de lait onctueuse, cacao ivoirien",
            2200,
            "café",
        ),
        item(
            "Café glacé coco",
            "Café froid infusé, lait de coco, sucre de canne",
            2500,
            "boisson froide",
        ),
        item(
            "Jus de bissap",
            "Hibiscus frais, menthe, gingembre",
            1000,
            "boisson froide",
        ),
        item(
            "Croissant beurre",
            "Croissant pur beurre, cuit sur place chaque matin",
            800,
            "pâtisserie",
        ),
        item(
            "Alloco sucré",
            "Bananes plantain caramélisées, pointe de cannelle",
            1500,
            "pâtisserie",
        ),
    ]
}

/// Insert the house coffees into an empty catalog.
///
/// Refuses to touch a catalog that already has products, so running it
/// twice can't duplicate the menu.
///
/// # Errors
///
/// Returns an error if the connection or an insert fails.
pub async fn run() -> Result<(), SeedError> {
    let pool = super::connect().await?;
    let products = ProductRepository::new(&pool);

    let existing = products.list_all().await?;
    if !existing.is_empty() {
        tracing::warn!(
            count = existing.len(),
            "Catalog already has products, nothing to do"
        );
        return Ok(());
    }

    let menu = house_coffees();
    let total = menu.len();
    for new in &menu {
        let product = products.create(new).await?;
        tracing::info!(id = %product.id, name = %product.name, "Seeded product");
    }

    tracing::info!(count = total, "Catalog seeded");
    Ok(())
}
