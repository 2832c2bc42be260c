//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use cafe_lagune_server::db;
use sqlx::SqlitePool;

/// Default database URL when neither `LAGUNE_DATABASE_URL` nor
/// `DATABASE_URL` is set. Matches the server's default.
const DEFAULT_DATABASE_URL: &str = "sqlite://cafe_lagune.db";

/// Connect to the configured database.
pub async fn connect() -> Result<SqlitePool, sqlx::Error> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("LAGUNE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_owned());

    tracing::info!("Connecting to database...");
    db::create_pool(&database_url).await
}
